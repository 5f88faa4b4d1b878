//! Minimal npm registry client for resolving published package versions.

use log::info;
use regex::Regex;
use reqwest::Client;
use semver::Version;
use serde::Deserialize;

use crate::error::NpmError;

pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

static MONACO_BUNDLE_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref REGISTRY_CLIENT: Client = reqwest::ClientBuilder::new()
        .user_agent(MONACO_BUNDLE_USER_AGENT)
        .build()
        .expect("Failed to construct reqwest client");
    static ref PACKAGE_NAME_RE: Regex =
        Regex::new(r"^(?:@(?:[a-z0-9\-*~][a-z0-9\-*._~]*)?/)?[a-z0-9\-~][a-z0-9\-._~]*$").unwrap();
}

/// Checks `name` against the package.json naming rules.
pub fn verify_package_name(name: &str) -> Result<(), NpmError> {
    let invalid = |reason| NpmError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if !PACKAGE_NAME_RE.is_match(name) {
        return Err(invalid("not match pattern"));
    }
    if name.is_empty() || name.len() > 214 {
        return Err(invalid("length should between 1 to 214"));
    }
    Ok(())
}

/// Tarball location and checksum of a published version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageDist {
    pub shasum: String,
    pub tarball: String,
}

/// Registry metadata for one published version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub version: String,
    pub dist: PackageDist,
}

impl PackageInfo {
    /// Returns the first required field that is empty.
    fn empty_field(&self) -> Option<&'static str> {
        [
            ("_id", &self.id),
            ("name", &self.name),
            ("version", &self.version),
            ("dist.shasum", &self.dist.shasum),
            ("dist.tarball", &self.dist.tarball),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// Response body of a version lookup: metadata, or an error message as a bare JSON string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistryResponse {
    Message(String),
    Info(PackageInfo),
}

/// Parses a registry response body for `name@version`.
pub fn parse_package_info(body: &str, name: &str, version: &str) -> Result<PackageInfo, NpmError> {
    let invalid = |reason: String| NpmError::InvalidPackageInfo {
        name: name.to_string(),
        version: version.to_string(),
        reason,
    };
    match serde_json::from_str::<RegistryResponse>(body) {
        Ok(RegistryResponse::Message(message)) => Err(NpmError::Registry {
            name: name.to_string(),
            version: version.to_string(),
            message,
        }),
        Ok(RegistryResponse::Info(info)) => {
            if let Some(field) = info.empty_field() {
                return Err(invalid(format!("empty \"{field}\"")));
            }
            // The version names a directory on disk.
            if let Err(err) = Version::parse(&info.version) {
                return Err(invalid(format!("version \"{}\": {err}", info.version)));
            }
            Ok(info)
        }
        Err(err) => Err(invalid(err.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct NpmRegistry {
    base_url: String,
    client: Client,
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(NPM_REGISTRY_URL)
    }
}

impl NpmRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: REGISTRY_CLIENT.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches metadata for `name` at `version`, or the `latest` tag when `None`.
    pub async fn fetch_package(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PackageInfo, NpmError> {
        let version = version.filter(|v| !v.is_empty()).unwrap_or("latest");
        verify_package_name(name)?;

        let url = format!("{}/{name}/{version}", self.base_url);
        info!("Resolving {name}@{version}");
        let body = self.client.get(&url).send().await?.text().await?;
        parse_package_info(&body, name, version)
    }
}
