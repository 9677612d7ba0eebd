//! User-facing strings for the upload UI.

use std::fmt;
use std::str::FromStr;

use mediadrop_protocol::Stage;
use serde::{Deserialize, Serialize};

/// UI language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "ru" | "ru-ru" => Ok(Self::Ru),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Ru => f.write_str("ru"),
        }
    }
}

impl Locale {
    pub fn stage_label(&self, stage: Stage) -> &'static str {
        match (self, stage) {
            (Self::En, Stage::Preparing) => "Preparing...",
            (Self::En, Stage::Uploading) => "Uploading...",
            (Self::En, Stage::Complete) => "Upload complete!",
            (Self::Ru, Stage::Preparing) => "Подготовка...",
            (Self::Ru, Stage::Uploading) => "Загрузка...",
            (Self::Ru, Stage::Complete) => "Загрузка завершена!",
        }
    }

    /// Size in megabytes with one decimal.
    pub fn size_label(&self, bytes: u64) -> String {
        let mb = bytes as f64 / (1024.0 * 1024.0);
        match self {
            Self::En => format!("Size: {mb:.1} MB"),
            Self::Ru => format!("Размер: {mb:.1} MB"),
        }
    }

    pub fn unsupported_file(&self, file_name: &str) -> String {
        match self {
            Self::En => {
                format!("File {file_name} is not supported. Upload images and videos only.")
            }
            Self::Ru => format!(
                "Файл {file_name} не поддерживается. Загружайте только изображения и видео."
            ),
        }
    }

    pub fn file_too_large(&self, file_name: &str, limit_bytes: u64) -> String {
        let limit_mb = limit_bytes / (1024 * 1024);
        match self {
            Self::En => format!("File {file_name} is larger than {limit_mb} MB."),
            Self::Ru => format!("Файл {file_name} больше {limit_mb} MB."),
        }
    }

    pub fn empty_file(&self, file_name: &str) -> String {
        match self {
            Self::En => format!("File {file_name} is empty."),
            Self::Ru => format!("Файл {file_name} пуст."),
        }
    }

    pub fn upload_failed(&self, file_name: &str) -> String {
        match self {
            Self::En => format!("Failed to upload {file_name}"),
            Self::Ru => format!("Ошибка загрузки файла {file_name}"),
        }
    }

    pub fn upload_cancelled(&self, file_name: &str) -> String {
        match self {
            Self::En => format!("Upload of {file_name} cancelled"),
            Self::Ru => format!("Загрузка {file_name} отменена"),
        }
    }

    pub fn unknown_error(&self) -> &'static str {
        match self {
            Self::En => "unknown error",
            Self::Ru => "неизвестная ошибка",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locale() {
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" RU ".parse::<Locale>(), Ok(Locale::Ru));
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn size_label_one_decimal() {
        assert_eq!(Locale::En.size_label(2 * 1024 * 1024), "Size: 2.0 MB");
        assert_eq!(Locale::Ru.size_label(1536 * 1024), "Размер: 1.5 MB");
    }

    #[test]
    fn stage_labels_differ_per_locale() {
        assert_eq!(Locale::En.stage_label(Stage::Complete), "Upload complete!");
        assert_eq!(Locale::Ru.stage_label(Stage::Preparing), "Подготовка...");
    }

    #[test]
    fn unsupported_notice_names_the_file() {
        assert!(Locale::En.unsupported_file("notes.txt").contains("notes.txt"));
        assert!(Locale::Ru.unsupported_file("notes.txt").contains("notes.txt"));
    }

    #[test]
    fn locale_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }
        let w: Wrapper = serde_json::from_str(r#"{"locale":"ru"}"#).unwrap();
        assert_eq!(w.locale, Locale::Ru);
    }
}
