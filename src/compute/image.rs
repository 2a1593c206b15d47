//! Marketplace images
//!
//! Images are given either as a `publisher:offer:sku:version` URN or as one
//! of the well-known aliases below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl Image {
    pub fn new(publisher: &str, offer: &str, sku: &str, version: &str) -> Self {
        Self {
            publisher: publisher.to_string(),
            offer: offer.to_string(),
            sku: sku.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.publisher, self.offer, self.sku, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("unknown image alias '{0}'")]
    UnknownAlias(String),
    #[error("invalid image URN '{0}', expected publisher:offer:sku:version")]
    InvalidUrn(String),
}

impl FromStr for Image {
    type Err = ImageError;

    fn from_str(urn: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = urn.split(':').collect();
        match parts.as_slice() {
            [publisher, offer, sku, version]
                if parts.iter().all(|p| !p.trim().is_empty()) =>
            {
                Ok(Image::new(publisher, offer, sku, version))
            }
            _ => Err(ImageError::InvalidUrn(urn.to_string())),
        }
    }
}

/// Well-known image alias
#[derive(Debug, Clone, Copy)]
pub struct ImageAlias {
    pub name: &'static str,
    pub publisher: &'static str,
    pub offer: &'static str,
    pub sku: &'static str,
    pub is_windows: bool,
}

impl ImageAlias {
    pub fn image(&self) -> Image {
        Image::new(self.publisher, self.offer, self.sku, "latest")
    }
}

const fn linux(name: &'static str, publisher: &'static str, offer: &'static str, sku: &'static str) -> ImageAlias {
    ImageAlias { name, publisher, offer, sku, is_windows: false }
}

const fn windows(name: &'static str, sku: &'static str) -> ImageAlias {
    ImageAlias {
        name,
        publisher: "MicrosoftWindowsServer",
        offer: "WindowsServer",
        sku,
        is_windows: true,
    }
}

pub const ALIASES: &[ImageAlias] = &[
    linux("CentOS", "OpenLogic", "CentOS", "7.3"),
    linux("CoreOS", "CoreOS", "CoreOS", "Stable"),
    linux("Debian", "credativ", "Debian", "8"),
    linux("openSUSE-Leap", "SUSE", "openSUSE-Leap", "42.2"),
    linux("RHEL", "RedHat", "RHEL", "7.3"),
    linux("SLES", "SUSE", "SLES", "12-SP2"),
    linux("UbuntuLTS", "Canonical", "UbuntuServer", "16.04-LTS"),
    windows("Win2016Datacenter", "2016-Datacenter"),
    windows("Win2012R2Datacenter", "2012-R2-Datacenter"),
    windows("Win2012Datacenter", "2012-Datacenter"),
    windows("Win2008R2SP1", "2008-R2-SP1"),
];

/// Image plus the OS family it boots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub image: Image,
    pub is_windows: bool,
}

/// Look up an alias (case-insensitive)
pub fn find_alias(name: &str) -> Option<&'static ImageAlias> {
    ALIASES.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

/// Resolve an alias or URN.
///
/// For URNs the OS family is taken from the publisher.
pub fn resolve(name: &str) -> Result<ResolvedImage, ImageError> {
    if let Some(alias) = find_alias(name) {
        return Ok(ResolvedImage {
            image: alias.image(),
            is_windows: alias.is_windows,
        });
    }

    if !name.contains(':') {
        return Err(ImageError::UnknownAlias(name.to_string()));
    }

    let image: Image = name.parse()?;
    let is_windows = image.publisher.to_ascii_lowercase().contains("windows");
    Ok(ResolvedImage { image, is_windows })
}
