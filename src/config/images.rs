use crate::data::student::ProfilePicture;
use axum::http::Uri;
use std::collections::HashSet;

pub const DEFAULT_IMAGE_HOSTS: [&str; 5] = [
    "images.unsplash.com",
    "t4.ftcdn.net",
    "i.pinimg.com",
    "i.pravatar.cc",
    "randomuser.me",
];

pub const PLACEHOLDER_IMAGE: &str =
    "https://i.pinimg.com/236x/a0/4d/84/a04d849cf591c2f980548b982f461401.jpg";

/// Hosts the roster page is willing to load profile pictures from. Only
/// affects rendering, stored pictures are never rewritten.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    allowed_hosts: HashSet<String>,
}

impl ImageConfig {
    pub fn new<S: AsRef<str>>(hosts: impl IntoIterator<Item = S>) -> Self {
        Self {
            allowed_hosts: hosts
                .into_iter()
                .map(|host| host.as_ref().trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
        }
    }

    ///comma separated, as found in `ROSTER_IMAGE_HOSTS`
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(uri) = url.parse::<Uri>() else {
            return false;
        };

        matches!(uri.scheme_str(), Some("http" | "https"))
            && uri
                .host()
                .is_some_and(|host| self.allowed_hosts.contains(&host.to_ascii_lowercase()))
    }

    pub fn src_for<'a>(&self, picture: &'a ProfilePicture) -> &'a str {
        match picture.as_url() {
            Some(url) if self.is_allowed(url) => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_HOSTS)
    }
}
