//! Classification of single command-line tokens.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `add` tokens. A leading `-` has no meaning here.
    Create,
    /// `modify` tokens. A leading `-` removes a tag.
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    TagAdd(&'a str),
    TagRemove(&'a str),
    AssigneeAdd(&'a str),
    Assignment { attr: &'a str, raw: &'a str },
    Word(&'a str),
}

/// Prefix markers win over `:` so `+a:b` stays a tag.
pub fn classify(token: &str, grammar: Grammar) -> Token<'_> {
    if let Some(name) = token.strip_prefix('+') {
        return Token::TagAdd(name);
    }
    if let Some(name) = token.strip_prefix('@') {
        return Token::AssigneeAdd(name);
    }
    if grammar == Grammar::Modify {
        if let Some(name) = token.strip_prefix('-') {
            return Token::TagRemove(name);
        }
    }
    match token.split_once(':') {
        Some((attr, raw)) if !attr.is_empty() => Token::Assignment { attr, raw },
        _ => Token::Word(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_prefixed_tokens() {
        assert_eq!(classify("+errand", Grammar::Create), Token::TagAdd("errand"));
        assert_eq!(classify("@alice", Grammar::Create), Token::AssigneeAdd("alice"));
        assert_eq!(classify("-errand", Grammar::Modify), Token::TagRemove("errand"));
    }

    #[test]
    fn dash_is_plain_text_when_creating() {
        assert_eq!(classify("-errand", Grammar::Create), Token::Word("-errand"));
        assert_eq!(
            classify("-x:y", Grammar::Create),
            Token::Assignment { attr: "-x", raw: "y" }
        );
    }

    #[test]
    fn prefix_beats_colon() {
        assert_eq!(classify("+a:b", Grammar::Modify), Token::TagAdd("a:b"));
        assert_eq!(classify("@team:ops", Grammar::Modify), Token::AssigneeAdd("team:ops"));
        assert_eq!(classify("-a:b", Grammar::Modify), Token::TagRemove("a:b"));
    }

    #[test]
    fn assignment_splits_on_first_colon_only() {
        assert_eq!(
            classify("garbage:::value", Grammar::Modify),
            Token::Assignment {
                attr: "garbage",
                raw: "::value"
            }
        );
        assert_eq!(
            classify("project:", Grammar::Create),
            Token::Assignment {
                attr: "project",
                raw: ""
            }
        );
    }

    #[test]
    fn leading_colon_and_empty_tokens_are_words() {
        assert_eq!(classify(":value", Grammar::Create), Token::Word(":value"));
        assert_eq!(classify("", Grammar::Modify), Token::Word(""));
        assert_eq!(classify("milk", Grammar::Create), Token::Word("milk"));
    }
}
