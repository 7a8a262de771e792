//! Feature service query construction.

use url::Url;

/// Service marker for the feature-retrieval protocol.
pub const SERVICE: &str = "WFS";

/// Protocol version requested from the service.
pub const VERSION: &str = "2.0.0";

/// Operation name for feature retrieval.
pub const REQUEST: &str = "GetFeature";

/// Default output encoding hint.
pub const DEFAULT_OUTPUT_FORMAT: &str = "application/json";

/// Default cap on the number of features requested.
pub const DEFAULT_MAX_FEATURES: u32 = 50_000;

/// Query parameters owned by the protocol, compared case-insensitively.
const PROTOCOL_PARAMS: &[&str] = &[
    "service",
    "version",
    "request",
    "typename",
    "typenames",
    "outputformat",
    "count",
    "maxfeatures",
];

/// Builds the GetFeature URL for a layer.
///
/// Query parameters already present on the endpoint are kept, except for
/// protocol parameters which are replaced.
///
/// # Example
///
/// ```
/// use geoport_fetch::query::feature_query_url;
/// use url::Url;
///
/// let endpoint = Url::parse("https://maps.example.com/geoserver/wfs").unwrap();
/// let url = feature_query_url(&endpoint, "topp:states", "application/json", 50_000);
/// assert_eq!(
///     url.as_str(),
///     "https://maps.example.com/geoserver/wfs?service=WFS&version=2.0.0&request=GetFeature\
///      &typeNames=topp%3Astates&outputFormat=application%2Fjson&count=50000"
/// );
/// ```
#[must_use]
pub fn feature_query_url(
    endpoint: &Url,
    layer: &str,
    output_format: &str,
    max_features: u32,
) -> Url {
    let kept: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(key, _)| !PROTOCOL_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("service", SERVICE)
        .append_pair("version", VERSION)
        .append_pair("request", REQUEST)
        .append_pair("typeNames", layer)
        .append_pair("outputFormat", output_format)
        .append_pair("count", &max_features.to_string());
    url
}
