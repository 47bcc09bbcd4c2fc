//! HTML and XML text helpers

/// Escape text for use inside HTML content or attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strip HTML tags from content
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Strip characters XML 1.0 does not allow (everything but tab, newline,
/// carriage return and the legal unicode ranges)
pub fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

/// Rewrite root-relative `href`/`src` attributes against `base_url`
pub fn absolutize_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}
