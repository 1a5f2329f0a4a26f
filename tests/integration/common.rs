use dispatch_scraper::proxy::ProxyIdentity;
use wiremock::MockServer;

/// Call-log URL on a host that only resolves when the request goes through
/// the mock proxy
pub const PROXIED_CALL_LOG_URL: &str = "http://call-log.test/call-log/index.php";

pub const CALL_LOG_PATH: &str = "/call-log/index.php";

pub const TEST_USER_AGENT: &str = "TestScraper/1.0 (+https://example.com/about)";

/// Returns the mock server's address as a proxy identity
pub fn proxy_identity(server: &MockServer) -> ProxyIdentity {
    let address = server.address();
    ProxyIdentity::new(address.ip().to_string(), address.port())
}

/// A call-log page listing the given recordings
pub fn call_log_page(relative_urls: &[&str]) -> String {
    let rows: String = relative_urls
        .iter()
        .map(|url| {
            format!(
                r#"<tr><td><audio src="{}"></audio></td><td>Grand County</td></tr>"#,
                url
            )
        })
        .collect();

    format!(
        r#"<html><body><div id="call-log-info"><table>{}</table></div></body></html>"#,
        rows
    )
}

/// A free-proxy-list style table with the given rows
pub fn proxy_list_page(rows: &[(&str, u16)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(host, port)| format!("<tr><td>{}</td><td>{}</td><td>US</td></tr>", host, port))
        .collect();

    format!(
        r#"<html><body><table id="proxylisttable"><thead><tr><th>IP Address</th><th>Port</th></tr></thead><tbody>{}</tbody></table></body></html>"#,
        rows
    )
}
