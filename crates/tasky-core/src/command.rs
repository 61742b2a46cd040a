use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid ID '{0}'")]
    InvalidId(String),
    #[error("unknown subcommand '{0}'")]
    UnknownSubcommand(String),
}

/// What one command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    List,
    Add(Vec<String>),
    Show(u64),
    Modify(u64, Vec<String>),
}

/// `[]`, `add <tokens..>`, `<id>` or `<id> modify <tokens..>`.
pub fn parse_invocation(args: &[String]) -> Result<Invocation, CommandError> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Invocation::List);
    };
    if first == "add" {
        return Ok(Invocation::Add(rest.to_vec()));
    }
    let id: u64 = first
        .parse()
        .map_err(|_| CommandError::InvalidId(first.clone()))?;
    match rest.split_first() {
        None => Ok(Invocation::Show(id)),
        Some((sub, tokens)) if sub == "modify" => Ok(Invocation::Modify(id, tokens.to_vec())),
        Some((sub, _)) => Err(CommandError::UnknownSubcommand(sub.clone())),
    }
}
