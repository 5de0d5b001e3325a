//! System instruction shared by all providers.

use chrono::Local;

const PERSONA: &str = "\
You are skiff, a cli code assistant.

It is a must to generate some text letting the user know your thinking \
process before using a tool, rather than immediately jumping to the tool \
and a conclusion. The order to follow is: text, tool, text.

You have been given tools to fulfill the user request. Keep using them \
until the request is fulfilled, and always check your progress so you do \
not loop forever.";

/// The fixed persona instruction, stamped with today's date.
pub fn system_prompt() -> String {
    format!(
        "{PERSONA}\n\nToday's date: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_the_date() {
        let prompt = system_prompt();
        assert!(prompt.contains("Today's date:"));
        assert!(prompt.contains("skiff"));
    }
}
