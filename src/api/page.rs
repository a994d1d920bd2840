use crate::stats::StatTuple;
use std::borrow::Cow;
use std::fmt::Write;

pub(super) fn index(hosts_lines: &[String], stats: &[StatTuple]) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>hostgate</title>\n\
         </head>\n\
         <body>\n\
         <h1>hostgate</h1>\n\
         <h2>Names</h2>\n\
         Line format: <code>{domain_name} {ip_address|domain_name_to_redirect_to}</code>\n\
         <form method=\"POST\" action=\"/save_hosts\">\n\
         <textarea name=\"hosts\" cols=\"80\" rows=\"25\">\n",
    );
    // NB: unwraps are safe: writing to a String can't fail.
    for line in hosts_lines {
        writeln!(page, "{}", escape(line)).unwrap();
    }
    page.push_str(
        "</textarea>\n\
         <br/>\n\
         <input type=\"submit\" value=\"Update\">\n\
         </form>\n\
         <h2>Stats</h2>\n\
         <table>\n",
    );
    for stat in stats {
        writeln!(
            page,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&stat.key),
            stat.value
        )
        .unwrap();
    }
    page.push_str("</table>\n</body>\n</html>\n");
    page
}

fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lists_hosts_and_stats() {
        let page = index(
            &["foo.test 1.2.3.4".to_string()],
            &[StatTuple {
                key: "requests".to_string(),
                value: 7,
            }],
        );
        assert!(page.contains("foo.test 1.2.3.4\n</textarea>"));
        assert!(page.contains("<tr><td>requests</td><td>7</td></tr>"));
    }

    #[test]
    fn hosts_lines_are_escaped() {
        let page = index(&["# </textarea><script>".to_string()], &[]);
        assert!(page.contains("# &lt;/textarea&gt;&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
