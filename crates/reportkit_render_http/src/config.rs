//! Server configuration from the environment and brand asset loading.

use std::path::{Path, PathBuf};

use reportkit_render::SpecBrandAssets;
use reportkit_render::conf::{V_BACKGROUND_PNG_EMBEDDED, V_LOGO_PNG_EMBEDDED};
use tracing::{info, warn};

/// Default bind address.
pub const C_ADDR_DEFAULT: &str = "0.0.0.0:8080";

const C_ENV_ADDR: &str = "REPORTKIT_ADDR";
const C_ENV_LOGO_PATH: &str = "REPORTKIT_LOGO_PATH";
const C_ENV_BACKGROUND_PATH: &str = "REPORTKIT_BACKGROUND_PATH";

const V_PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecServerConfig {
    pub addr: String,
    pub logo_path: Option<PathBuf>,
    pub background_path: Option<PathBuf>,
}

impl SpecServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            addr: read(C_ENV_ADDR).unwrap_or_else(|| C_ADDR_DEFAULT.to_string()),
            logo_path: read(C_ENV_LOGO_PATH).map(PathBuf::from),
            background_path: read(C_ENV_BACKGROUND_PATH).map(PathBuf::from),
        }
    }

    /// Load brand images once at start-up, falling back to the embedded PNGs.
    pub fn load_brand_assets(&self) -> SpecBrandAssets {
        SpecBrandAssets {
            logo_png: load_png_or_embedded(self.logo_path.as_deref(), V_LOGO_PNG_EMBEDDED, "logo"),
            background_png: load_png_or_embedded(
                self.background_path.as_deref(),
                V_BACKGROUND_PNG_EMBEDDED,
                "background",
            ),
        }
    }
}

fn load_png_or_embedded(path: Option<&Path>, embedded: &[u8], name: &str) -> Vec<u8> {
    let Some(path) = path else {
        return embedded.to_vec();
    };
    match std::fs::read(path) {
        Ok(v_bytes) if v_bytes.starts_with(V_PNG_SIGNATURE) => {
            info!(asset = name, path = %path.display(), "loaded brand asset");
            v_bytes
        }
        Ok(_) => {
            warn!(asset = name, path = %path.display(), "brand asset is not a PNG; using embedded copy");
            embedded.to_vec()
        }
        Err(err) => {
            warn!(asset = name, path = %path.display(), error = %err, "brand asset unreadable; using embedded copy");
            embedded.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_defaults_and_blank_values() {
        let cfg = SpecServerConfig::from_lookup(|key| (key == C_ENV_LOGO_PATH).then(|| "  ".to_string()));
        assert_eq!(cfg.addr, C_ADDR_DEFAULT);
        assert_eq!(cfg.logo_path, None);
        assert_eq!(cfg.background_path, None);
    }

    #[test]
    fn test_missing_asset_falls_back_to_embedded() {
        let cfg = SpecServerConfig {
            addr: C_ADDR_DEFAULT.to_string(),
            logo_path: Some(PathBuf::from("/nonexistent/logo.png")),
            background_path: None,
        };
        let assets = cfg.load_brand_assets();
        assert_eq!(assets.logo_png, V_LOGO_PNG_EMBEDDED);
        assert_eq!(assets.background_png, V_BACKGROUND_PNG_EMBEDDED);
    }
}
