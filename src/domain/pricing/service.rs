//! Purchasable engagement services and the platforms they target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ConfigurationError;

/// Social platform a service is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
    Twitch,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::Twitch => "twitch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            "twitch" => Ok(Platform::Twitch),
            other => Err(ConfigurationError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Engagement product a customer can purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    InstagramFollowers,
    InstagramLikes,
    TiktokFollowers,
    TiktokViews,
    YoutubeViews,
    YoutubeSubscribers,
    TwitchFollowers,
    TwitchViewers,
}

impl ServiceType {
    pub const ALL: [ServiceType; 8] = [
        ServiceType::InstagramFollowers,
        ServiceType::InstagramLikes,
        ServiceType::TiktokFollowers,
        ServiceType::TiktokViews,
        ServiceType::YoutubeViews,
        ServiceType::YoutubeSubscribers,
        ServiceType::TwitchFollowers,
        ServiceType::TwitchViewers,
    ];

    /// Wire name, as carried in gateway metadata and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::InstagramFollowers => "INSTAGRAM_FOLLOWERS",
            ServiceType::InstagramLikes => "INSTAGRAM_LIKES",
            ServiceType::TiktokFollowers => "TIKTOK_FOLLOWERS",
            ServiceType::TiktokViews => "TIKTOK_VIEWS",
            ServiceType::YoutubeViews => "YOUTUBE_VIEWS",
            ServiceType::YoutubeSubscribers => "YOUTUBE_SUBSCRIBERS",
            ServiceType::TwitchFollowers => "TWITCH_FOLLOWERS",
            ServiceType::TwitchViewers => "TWITCH_VIEWERS",
        }
    }

    /// Platform the service is delivered on.
    pub fn platform(&self) -> Platform {
        match self {
            ServiceType::InstagramFollowers | ServiceType::InstagramLikes => Platform::Instagram,
            ServiceType::TiktokFollowers | ServiceType::TiktokViews => Platform::Tiktok,
            ServiceType::YoutubeViews | ServiceType::YoutubeSubscribers => Platform::Youtube,
            ServiceType::TwitchFollowers | ServiceType::TwitchViewers => Platform::Twitch,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ServiceType::ALL
            .iter()
            .copied()
            .find(|service| service.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigurationError::UnknownService(wanted.to_string()))
    }
}
