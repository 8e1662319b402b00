//! User-facing messages.
//!
//! The marketplace UI is Macedonian; English is available for development
//! and for API consumers that ask for it via `FREE_ADS_LOCALE=en`.

use std::str::FromStr;

/// Language used for messages returned to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// Macedonian.
    #[default]
    Mk,
    /// English.
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mk" | "mk-mk" => Ok(Self::Mk),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            other => Err(format!("unsupported locale '{other}' (expected 'mk' or 'en')")),
        }
    }
}

/// A message that can be shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    AddPhotoFailed,
    AlreadyMainPhoto,
    SetMainPhotoFailed,
    CannotDeleteMainPhoto,
    DeletePhotoFailed,
    EmptyUpload,
    PhotoNotFound,
    UserNotFound,
    ImageHostUnavailable,
    Unauthorized,
    InternalError,
}

impl Message {
    /// Text of this message in `locale`.
    #[must_use]
    pub const fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Mk => self.mk(),
            Locale::En => self.en(),
        }
    }

    const fn mk(self) -> &'static str {
        match self {
            Self::AddPhotoFailed => "Грешка при додавање на сликата",
            Self::AlreadyMainPhoto => "Сликата е веќе главна слика на огласот",
            Self::SetMainPhotoFailed => "Грешка при поставување на сликата главна слика на огласот",
            Self::CannotDeleteMainPhoto => "Не можете да ја бришете главната слика",
            Self::DeletePhotoFailed => "Грешка при бришење на сликата",
            Self::EmptyUpload => "Не е избрана слика за прикачување",
            Self::PhotoNotFound => "Сликата не постои",
            Self::UserNotFound => "Корисникот не постои",
            Self::ImageHostUnavailable => "Сервисот за слики е моментално недостапен",
            Self::Unauthorized => "Немате дозвола за оваа акција",
            Self::InternalError => "Грешка на серверот",
        }
    }

    const fn en(self) -> &'static str {
        match self {
            Self::AddPhotoFailed => "Could not add the photo",
            Self::AlreadyMainPhoto => "This is already the main photo",
            Self::SetMainPhotoFailed => "Could not set the photo to main",
            Self::CannotDeleteMainPhoto => "You cannot delete the main photo",
            Self::DeletePhotoFailed => "Failed to delete the photo",
            Self::EmptyUpload => "No image was selected for upload",
            Self::PhotoNotFound => "Photo not found",
            Self::UserNotFound => "User not found",
            Self::ImageHostUnavailable => "The image service is currently unavailable",
            Self::Unauthorized => "You are not allowed to do this",
            Self::InternalError => "Internal server error",
        }
    }
}
