//! Invocações de saída do `az` e sua classificação estrutural.
//!
//! Cada chamada monta um [`Invocation`] por um dos construtores tipados, que
//! registra o [`InvocationKind`] de antemão. O portão de confirmação decide
//! apenas pelo tipo, sem reexaminar o vetor de argumentos.

/// A ferramenta de linha de comando encapsulada.
pub const AZ: &str = "az";

/// Formato de uma chamada de saída, do ponto de vista do risco de mutação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationKind {
    /// `az rest`, classificado pelo método HTTP declarado.
    Remote { method: Option<String> },
    /// `az boards work-item <verb> [<subverb>]`.
    DomainOp {
        verb: String,
        subverb: Option<String>,
    },
    /// Qualquer outra coisa (consultas, identidade, padrões).
    Other,
}

impl InvocationKind {
    /// Se a chamada deve alterar o estado remoto.
    ///
    /// Chamadas remotas alteram, exceto com método `GET`; método ausente
    /// conta como alteração. `create`, `update` e `delete` de work item
    /// alteram, assim como `relation add|remove|delete`. O resto, inclusive
    /// formatos desconhecidos, é leitura.
    pub fn is_mutating(&self) -> bool {
        match self {
            InvocationKind::Remote { method } => method
                .as_deref()
                .is_none_or(|m| !m.eq_ignore_ascii_case("get")),
            InvocationKind::DomainOp { verb, subverb } => {
                let verb = verb.to_ascii_lowercase();
                match verb.as_str() {
                    "create" | "update" | "delete" => true,
                    "relation" => subverb.as_deref().is_some_and(|op| {
                        matches!(
                            op.to_ascii_lowercase().as_str(),
                            "add" | "remove" | "delete"
                        )
                    }),
                    _ => false,
                }
            }
            InvocationKind::Other => false,
        }
    }
}

/// Uma chamada de saída: o vetor de argumentos do `az` e seu tipo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    kind: InvocationKind,
}

impl Invocation {
    /// `az rest [--method <method>] --url <url>`.
    pub fn rest(method: Option<&str>, url: &str) -> Self {
        let mut args = vec!["rest".to_string()];
        if let Some(m) = method {
            args.push("--method".into());
            args.push(m.to_string());
        }
        args.push("--url".into());
        args.push(url.to_string());
        Self {
            args,
            kind: InvocationKind::Remote {
                method: method.map(str::to_string),
            },
        }
    }

    /// `az boards work-item <verb> ...`.
    pub fn work_item(verb: &str) -> Self {
        Self {
            args: vec!["boards".into(), "work-item".into(), verb.to_string()],
            kind: InvocationKind::DomainOp {
                verb: verb.to_string(),
                subverb: None,
            },
        }
    }

    /// `az boards work-item relation <op> ...`.
    pub fn work_item_relation(op: &str) -> Self {
        Self {
            args: vec![
                "boards".into(),
                "work-item".into(),
                "relation".into(),
                op.to_string(),
            ],
            kind: InvocationKind::DomainOp {
                verb: "relation".into(),
                subverb: Some(op.to_string()),
            },
        }
    }

    /// Qualquer outro comando `az`, tratado como leitura.
    pub fn other<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kind: InvocationKind::Other,
        }
    }

    /// Acrescenta um argumento.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Acrescenta uma flag seguida do valor.
    pub fn flag(self, name: &str, value: impl Into<String>) -> Self {
        self.arg(name).arg(value)
    }

    /// Pede saída em JSON (`-o json`).
    pub fn json(self) -> Self {
        self.flag("-o", "json")
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn kind(&self) -> &InvocationKind {
        &self.kind
    }

    pub fn is_mutating(&self) -> bool {
        self.kind.is_mutating()
    }

    /// Valor que segue `flag`, se houver.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }

    /// Linha com escape de shell, pronta para colar no terminal e repetir a
    /// chamada.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(AZ).chain(self.args.iter().map(String::as_str)))
    }
}
