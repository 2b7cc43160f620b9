//! HTML to PDF conversion through a Gotenberg instance.

use crate::error::ApiError;
use log::{error, info};
use reqwest::multipart::{Form, Part};

const CONVERT_HTML_PATH: &str = "/forms/chromium/convert/html";

/// Posts `html` as `index.html` and returns the PDF bytes.
pub async fn html_to_pdf(
    client: &reqwest::Client,
    base_url: &str,
    html: String,
) -> Result<Vec<u8>, ApiError> {
    let part = Part::text(html)
        .file_name("index.html")
        .mime_str("text/html")
        .map_err(|err| ApiError::internal(format!("invalid multipart mime: {err}")))?;
    let form = Form::new().part("files", part);
    let url = format!("{base_url}{CONVERT_HTML_PATH}");

    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| {
            let reason = err.without_url().to_string();
            error!(
                "event=pdf_convert module=api status=error reason={}",
                reason
            );
            ApiError::internal(format!("gotenberg conversion failed: {reason}"))
        })?;

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ApiError::internal(format!("gotenberg response unreadable: {err}")))?;
    info!(
        "event=pdf_convert module=api status=ok bytes={}",
        bytes.len()
    );
    Ok(bytes.to_vec())
}
