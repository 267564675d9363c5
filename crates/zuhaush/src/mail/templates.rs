use super::OutboundEmail;

/// One-time code message. `action` reads like "complete your registration".
pub fn one_time_code(to: &str, action: &str, code: &str, ttl_minutes: i64) -> OutboundEmail {
    let text = format!(
        "Your Zuhaush verification code is {code}.\n\nUse it to {action}. \
         The code expires in {ttl_minutes} minutes. If you did not request it, ignore this e-mail."
    );
    let html = format!(
        "<p>Your Zuhaush verification code is</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{code}</p>\
         <p>Use it to {action}. The code expires in {ttl_minutes} minutes.</p>\
         <p>If you did not request it, ignore this e-mail.</p>"
    );

    OutboundEmail {
        to: to.to_string(),
        subject: format!("Your Zuhaush verification code: {code}"),
        text,
        html,
    }
}

pub fn welcome(to: &str, name: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Welcome to Zuhaush".to_string(),
        text: format!("Hi {name},\n\nYour Zuhaush account is ready. Happy house hunting!"),
        html: format!("<p>Hi {name},</p><p>Your Zuhaush account is ready. Happy house hunting!</p>"),
    }
}

/// Six-digit code embedded in a message body, if any.
pub fn extract_code(body: &str) -> Option<String> {
    body.split(|c: char| !c.is_ascii_digit())
        .find(|chunk| chunk.len() == 6)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips_through_message_body() {
        let email = one_time_code("a@x.io", "reset your password", "482913", 10);
        assert_eq!(extract_code(&email.text).as_deref(), Some("482913"));
        assert!(email.text.contains("10 minutes"));
        assert!(email.subject.ends_with("482913"));
    }

    #[test]
    fn welcome_mentions_name() {
        let email = welcome("a@x.io", "Asha");
        assert!(email.text.starts_with("Hi Asha"));
    }
}
