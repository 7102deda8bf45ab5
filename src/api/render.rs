use crate::api::dto::inbox::InboxEntry;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// HTML pages for the inbox UI. Built once at startup and shared through router state.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    index_page: String,
}

impl HtmlRenderer {
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let domain = escape_html(domain);
        let index_page = format!(
            r#"<html><body>
<h3>What is this?</h3>
<p>Send an email to <b><i>anything</i>@{domain}</b>, then visit <a href="/anything">/anything</a> to see the emails it has received.</p>
<p>This is useful for debugging outgoing email, and for signing up to services that insist on a working address.</p>
<p>Every inbox is <b>public</b>: anyone who guesses the name can read it. Messages disappear on their own after a while unless pinned.</p>
</body></html>"#
        );
        Self { index_page }
    }

    #[must_use]
    pub fn index(&self) -> &str {
        &self.index_page
    }

    #[must_use]
    pub fn inbox(&self, address: &str, entries: &[InboxEntry]) -> String {
        let mut page = String::with_capacity(1024);
        page.push_str(&format!("<html><body>\n<h3>Mails to: {}</h3>\n", escape_html(address)));

        if entries.is_empty() {
            page.push_str("No mails have been sent to this address.\n");
        } else {
            page.push_str("<table border=\"1\">\n");
            for entry in entries {
                page.push_str(&format!(
                    concat!(
                        "  <tr>\n",
                        "    <td>{received}<br>expires {expires}</td>\n",
                        "    <td><b>{subject}</b><pre>{body}</pre></td>\n",
                        "    <td>\n",
                        "      <form method=\"post\" action=\"/action\"><input type=\"hidden\" name=\"action\" value=\"pin\">",
                        "<input type=\"hidden\" name=\"id\" value=\"{id}\"><button>Pin</button></form>\n",
                        "      <form method=\"post\" action=\"/action\"><input type=\"hidden\" name=\"action\" value=\"delete\">",
                        "<input type=\"hidden\" name=\"id\" value=\"{id}\"><button>Delete</button></form>\n",
                        "    </td>\n",
                        "  </tr>\n",
                    ),
                    received = format_time(entry.received_at),
                    expires = format_time(entry.expire_at),
                    subject = escape_html(&entry.subject),
                    body = escape_html(&entry.body),
                    id = entry.id,
                ));
            }
            page.push_str("</table>\n");
        }

        page.push_str("</body></html>");
        page
    }
}

fn format_time(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
