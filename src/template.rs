pub const SUBJECT: &str = "Код подтверждения для Monkey Messenger";

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the verification email body for `code`, stamped with `year`.
pub fn render_body(code: &str, year: i32) -> String {
    let code = escape_html(code);
    format!(
        r##"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #4A90E2;">Monkey Messenger - Двухфакторная аутентификация</h2>
  <p>Ваш код подтверждения:</p>
  <div style="font-size: 24px; font-weight: bold; background-color: #f1f1f1; padding: 15px; text-align: center; letter-spacing: 5px;">
    {code}
  </div>
  <p style="margin-top: 20px;">Код действителен в течение 5 минут.</p>
  <p style="margin-top: 30px; font-size: 12px; color: #666;">
    Если вы не запрашивали код подтверждения, пожалуйста, проигнорируйте это сообщение.
  </p>
  <p style="font-size: 12px; color: #666;">
    © {year} Monkey Messenger. Все права защищены.
  </p>
</div>
"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_code_and_year() {
        let body = render_body("482913", 2026);
        assert!(body.contains("482913"));
        assert!(body.contains("© 2026 Monkey Messenger"));
    }

    #[test]
    fn code_is_escaped() {
        let body = render_body("<b>1&2</b>", 2026);
        assert!(body.contains("&lt;b&gt;1&amp;2&lt;/b&gt;"));
        assert!(!body.contains("<b>"));
    }
}
