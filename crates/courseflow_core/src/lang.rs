/// Human-readable label for a subtitle language code.
///
/// The archive records region-qualified codes for Chinese; everything else
/// is a bare ISO 639-1 code. Unknown codes fall back to "English", matching
/// the platform the documents are published to.
pub fn language_display_name(code: &str) -> &'static str {
    let normalized = match code {
        "zh-CN" => "zh-hans",
        "zh-TW" => "zh-hant",
        other => other,
    };
    match normalized.to_ascii_lowercase().as_str() {
        "zh-hans" => "Simplified Chinese",
        "zh-hant" => "Traditional Chinese",
        "en" => "English",
        "de" => "German",
        "es" => "Spanish",
        "fr" => "French",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "id" => "Indonesian",
        "tr" => "Turkish",
        "vi" => "Vietnamese",
        _ => "English",
    }
}
