//! Server-rendered HTML. Deliberately unstyled.

use std::fmt::Write;

use crate::auth::dto::{FieldErrors, OldInput};

/// Escape text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

struct Input<'a> {
    name: &'a str,
    label: &'a str,
    kind: &'a str,
    value: &'a str,
}

fn field(out: &mut String, input: Input<'_>, errors: &FieldErrors) {
    let _ = write!(
        out,
        "<div>\n<label for=\"{n}\">{label}</label>\n\
         <input id=\"{n}\" name=\"{n}\" type=\"{kind}\" value=\"{value}\">\n",
        n = input.name,
        label = input.label,
        kind = input.kind,
        value = escape(input.value),
    );
    if let Some(message) = errors.get(input.name) {
        let _ = writeln!(out, "<p class=\"error\">{}</p>", escape(message));
    }
    out.push_str("</div>\n");
}

fn form_open(out: &mut String, action: &str, csrf: &str) {
    let _ = write!(
        out,
        "<form method=\"POST\" action=\"{action}\">\n\
         <input type=\"hidden\" name=\"_token\" value=\"{}\">\n",
        escape(csrf)
    );
}

pub fn welcome() -> String {
    layout(
        "Welcome",
        "<h1>Welcome</h1>\n<p><a href=\"/signin\">Sign in</a> or \
         <a href=\"/signup\">create an account</a>.</p>",
    )
}

pub fn signup_page(csrf: &str, old: &OldInput, errors: &FieldErrors) -> String {
    let mut body = String::from("<h1>Sign up</h1>\n");
    form_open(&mut body, "/signup", csrf);
    let inputs = [
        Input { name: "name", label: "Name", kind: "text", value: &old.name },
        Input { name: "email", label: "Email", kind: "email", value: &old.email },
        Input { name: "password", label: "Password", kind: "password", value: "" },
        Input {
            name: "password_confirmation",
            label: "Confirm password",
            kind: "password",
            value: "",
        },
    ];
    for input in inputs {
        field(&mut body, input, errors);
    }
    body.push_str("<button type=\"submit\">Sign up</button>\n</form>\n");
    body.push_str("<p>Already registered? <a href=\"/signin\">Sign in</a></p>");
    layout("Sign up", &body)
}

pub fn signin_page(csrf: &str, old: &OldInput, errors: &FieldErrors) -> String {
    let mut body = String::from("<h1>Sign in</h1>\n");
    form_open(&mut body, "/signin", csrf);
    field(
        &mut body,
        Input { name: "email", label: "Email", kind: "email", value: &old.email },
        errors,
    );
    field(
        &mut body,
        Input { name: "password", label: "Password", kind: "password", value: "" },
        errors,
    );
    body.push_str("<button type=\"submit\">Sign in</button>\n</form>\n");
    body.push_str("<p>No account yet? <a href=\"/signup\">Sign up</a></p>");
    layout("Sign in", &body)
}

// Placeholder figures; the dashboard has no data source.
const CARDS: &[(&str, &[&str])] = &[
    ("Total Users", &["1,250"]),
    ("Sales Revenue", &["$7,000"]),
    ("New Signups", &["320"]),
    ("Website Traffic", &["150,000 Visitors"]),
    (
        "Revenue by Region",
        &["North America: $4,000", "Europe: $2,000", "Asia: $1,000"],
    ),
];

const NAV: &[(&str, &str)] = &[
    ("Dashboard", "/dashboard"),
    ("Analytics", "#"),
    ("Users", "#"),
    ("Settings", "#"),
    ("Reports", "#"),
    ("Log Out", "/logout"),
];

pub fn dashboard_page(user_name: &str) -> String {
    let mut body = String::from("<nav>\n");
    for (label, href) in NAV {
        let _ = writeln!(body, "<a href=\"{href}\">{label}</a>");
    }
    let _ = write!(
        body,
        "</nav>\n<h1>Company Dashboard</h1>\n<p>Signed in as {}</p>\n",
        escape(user_name)
    );
    for (title, lines) in CARDS {
        let _ = writeln!(body, "<section>\n<h2>{title}</h2>");
        for line in *lines {
            let _ = writeln!(body, "<p>{line}</p>");
        }
        body.push_str("</section>\n");
    }
    body.push_str("<footer><p>&copy; 2025 Company Name. All Rights Reserved.</p></footer>");
    layout("Dashboard", &body)
}

pub fn page_expired() -> String {
    layout(
        "Page Expired",
        "<h1>419 | Page Expired</h1>\n<p>Reload the form and try again.</p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn signup_form_echoes_old_input_but_not_passwords() {
        let old = OldInput { name: "Al".into(), email: "al@example.com".into() };
        let mut errors = FieldErrors::default();
        errors.add("name", "The name field must be at least 3 characters.");
        let html = signup_page("tok", &old, &errors);
        assert!(html.contains(r#"name="name" type="text" value="Al""#));
        assert!(html.contains(r#"value="al@example.com""#));
        assert!(html.contains(r#"name="password" type="password" value="""#));
        assert!(html.contains(r#"name="_token" value="tok""#));
        assert!(html.contains("The name field must be at least 3 characters."));
    }

    #[test]
    fn user_supplied_values_are_escaped() {
        let old = OldInput { name: "\"><b>x".into(), email: String::new() };
        let html = signup_page("tok", &old, &FieldErrors::default());
        assert!(!html.contains("<b>x"));
        assert!(html.contains("&quot;&gt;&lt;b&gt;x"));
    }

    #[test]
    fn dashboard_lists_placeholders_and_logout() {
        let html = dashboard_page("Alice");
        assert!(html.contains("Total Users"));
        assert!(html.contains("Asia: $1,000"));
        assert!(html.contains(r#"href="/logout""#));
        assert!(html.contains("Signed in as Alice"));
    }
}
