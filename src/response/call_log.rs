use scraper::{Html, Selector};

/// Element that wraps the call-log table
pub const CALL_LOG_CONTAINER: &str = "#call-log-info";

/// Audio elements in the first column of the call-log table
pub const CALL_LOG_AUDIO_SELECTOR: &str =
    "#call-log-info table tr > td:first-of-type > audio[src]";

/// Extracts the relative URLs of the recordings listed on a call-log page
///
/// URLs are returned in document order. A page that has the call-log
/// container but no recordings yields an empty list.
///
/// # Arguments
///
/// * `html` - The call-log page body
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The `src` attribute of every recording
/// * `Err(String)` - The call-log container is missing (site layout changed
///   or the proxy served a different page)
///
/// # Example
///
/// ```
/// use dispatch_scraper::response::extract_call_relative_urls;
///
/// let html = r#"<div id="call-log-info"><table><tr>
///     <td><audio src="/audio/2020/05/01/call.mp3"></audio></td>
/// </tr></table></div>"#;
/// let urls = extract_call_relative_urls(html).unwrap();
/// assert_eq!(urls, vec!["/audio/2020/05/01/call.mp3"]);
/// ```
pub fn extract_call_relative_urls(html: &str) -> Result<Vec<String>, String> {
    let document = Html::parse_document(html);

    let container = Selector::parse(CALL_LOG_CONTAINER).map_err(|e| e.to_string())?;
    if document.select(&container).next().is_none() {
        return Err(format!("no '{}' element in response", CALL_LOG_CONTAINER));
    }

    let audio = Selector::parse(CALL_LOG_AUDIO_SELECTOR).map_err(|e| e.to_string())?;
    let urls = document
        .select(&audio)
        .filter_map(|element| element.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect();

    Ok(urls)
}
