use upload_config::{Recency, SelectionConfig};

/// Derives an orderable key from a package file name. `None` means the name
/// carries no usable key and the package is left out of selection.
pub trait RecencyKeyExtractor {
    fn extract(&self, file_name: &str) -> Option<u64>;
}

/// Reads `<name>-<date>-<time>.<ext>` as the number `<date><time>`.
#[derive(Debug, Clone)]
pub struct TimestampKey {
    extension: String,
    delimiter: String,
}

impl TimestampKey {
    #[must_use]
    pub fn new(extension: &str, delimiter: &str) -> Self {
        Self {
            extension: extension.to_string(),
            delimiter: delimiter.to_string(),
        }
    }
}

impl RecencyKeyExtractor for TimestampKey {
    fn extract(&self, file_name: &str) -> Option<u64> {
        let parts: Vec<&str> = file_name.split(self.delimiter.as_str()).collect();
        if parts.len() < 3 {
            return None;
        }
        let date = parts[parts.len() - 2];
        let time = strip_extension(parts[parts.len() - 1], &self.extension);
        parse_digits(&format!("{date}{time}"))
    }
}

/// Reads the digits ending `<name>-<version>.<ext>`, so `rom-v12.zip` is 12.
#[derive(Debug, Clone)]
pub struct VersionKey {
    extension: String,
    delimiter: String,
}

impl VersionKey {
    #[must_use]
    pub fn new(extension: &str, delimiter: &str) -> Self {
        Self {
            extension: extension.to_string(),
            delimiter: delimiter.to_string(),
        }
    }
}

impl RecencyKeyExtractor for VersionKey {
    fn extract(&self, file_name: &str) -> Option<u64> {
        let (_, last) = file_name.rsplit_once(self.delimiter.as_str())?;
        let token = strip_extension(last, &self.extension);
        let digits_start = token.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        parse_digits(&token[digits_start..])
    }
}

#[must_use]
pub fn extractor_for(config: &SelectionConfig) -> Box<dyn RecencyKeyExtractor> {
    match config.recency {
        Recency::Timestamp => Box::new(TimestampKey::new(&config.extension, &config.delimiter)),
        Recency::Version => Box::new(VersionKey::new(&config.extension, &config.delimiter)),
    }
}

fn strip_extension<'a>(segment: &'a str, extension: &str) -> &'a str {
    segment
        .strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(segment)
}

fn parse_digits(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
