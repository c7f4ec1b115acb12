use crate::{Error, Result};

/// Quote a single word for the remote shell. Only a NUL byte can't be quoted.
#[inline]
pub fn quote(input: &str) -> Result<String> {
    shlex::try_quote(input)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| Error::InvalidInput(format!("can't quote {:?} for remote shell", input)))
}

/// Quote `name=value` pair as used by `set`, `create -o` and friends.
pub fn quote_assignment(name: &str, value: &str) -> Result<String> {
    Ok(format!("{}={}", quote(name)?, quote(value)?))
}

/// Strip exactly one trailing newline.
#[inline(always)]
pub fn strip_newline(mut input: String) -> String {
    if input.ends_with('\n') {
        input.pop();
    }
    input
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_quote_safe_words_untouched() {
        assert_eq!("tank/fs", quote("tank/fs").unwrap());
        assert_eq!("/dev/sda", quote("/dev/sda").unwrap());
        assert_eq!("compression=on", quote_assignment("compression", "on").unwrap());
    }

    #[test]
    fn test_quote_metacharacters() {
        let quoted = quote("on; rm -rf /").unwrap();
        assert_ne!("on; rm -rf /", quoted);
        assert!(quoted.starts_with('\'') || quoted.starts_with('"'));
    }

    #[test]
    fn test_quote_nul() {
        let err = quote("a\0b").unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn test_strip_newline_once() {
        assert_eq!("a\n", strip_newline(String::from("a\n\n")));
        assert_eq!("a", strip_newline(String::from("a")));
        assert_eq!("", strip_newline(String::from("\n")));
    }
}
