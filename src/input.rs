use anyhow::{Result, bail};
use std::io::{self, IsTerminal, Read};
use zeroize::Zeroizing;

/// Read the text to work on.
///
/// Order: the command-line argument, then piped stdin, then an interactive
/// prompt that does not echo.
pub fn read_input(arg: Option<String>, prompt: &str) -> Result<Zeroizing<String>> {
    //  Argument
    //  neoncrypt encrypt "meet at noon"
    if let Some(text) = arg {
        return non_empty(Zeroizing::new(text));
    }

    //  stdin (Pipeline)
    //  echo "meet at noon" | neoncrypt encrypt
    //  neoncrypt decrypt < token.txt
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        trim_newline(&mut buf);
        return non_empty(buf);
    }

    //  Interactive (TTY)
    non_empty(Zeroizing::new(rpassword::prompt_password(prompt)?))
}

fn non_empty(text: Zeroizing<String>) -> Result<Zeroizing<String>> {
    if text.trim().is_empty() {
        bail!("no input provided");
    }
    Ok(text)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
