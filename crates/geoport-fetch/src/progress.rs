//! Job progress bands for the fetch stage.
//!
//! A job's 0-100 progress is split into a connecting band (0-10), a
//! download band (10-80) and a processing band (80-100).

/// Progress reported while the request is being sent.
pub const CONNECTING: u8 = 5;

/// Progress at the start of the download band.
pub const DOWNLOAD_START: u8 = 10;

/// Width of the download band.
pub const DOWNLOAD_SPAN: u8 = 70;

/// Progress at the end of the download band.
pub const DOWNLOAD_END: u8 = DOWNLOAD_START + DOWNLOAD_SPAN;

/// Progress held while the server did not declare a content length.
pub const UNKNOWN_LENGTH: u8 = 50;

/// Returns the job progress after `bytes_read` bytes of the body.
///
/// With a declared length this is `10 + round(bytes_read / total * 70)`,
/// clamped to the download band. Without one the fraction is undefined and
/// progress holds at [`UNKNOWN_LENGTH`].
///
/// # Example
///
/// ```
/// use geoport_fetch::download_percent;
///
/// assert_eq!(download_percent(50, Some(100)), 45);
/// assert_eq!(download_percent(50, None), 50);
/// ```
#[must_use]
pub fn download_percent(bytes_read: u64, total: Option<u64>) -> u8 {
    match total {
        Some(0) => DOWNLOAD_END,
        Some(total) => {
            let fraction = (bytes_read as f64 / total as f64).min(1.0);
            DOWNLOAD_START + (fraction * f64::from(DOWNLOAD_SPAN)).round() as u8
        }
        None => UNKNOWN_LENGTH,
    }
}
