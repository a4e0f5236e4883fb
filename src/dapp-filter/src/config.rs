//! Registry configuration with TOML file support.

use std::{collections::BTreeSet, path::Path, sync::Arc};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use dapp_filter_types::{parse_selector, ListId, DEFAULT_LIST};

use crate::{
    errors::ConfigError,
    filters::{CurveFilter, DaiJoinFilter, Filter, LidoFilter, MakerModules, PotFilter, SelectorFilter, VatFilter},
    registry::DappRegistry,
};

/// Registry contents plus the lists an executor consults.
///
/// Loaded via [`RegistryConfig::from_file`] or built programmatically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub lists: Vec<ListConfig>,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    pub id: ListId,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub entries: Vec<EntryConfig>,

    /// Registers the pot, vat and DAI join filters wired to each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker: Option<MakerModules>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub target: Address,
    pub filter: FilterConfig,
}

/// Which filter to build for a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    Lido,
    Curve,
    Pot,
    DaiJoin,
    Vat {
        dai_join: Address,
        pot: Address,
    },
    Selectors {
        /// Method signatures (`"deposit(uint256)"`) or raw selectors (`"0xb6b55f25"`).
        #[serde(default)]
        signatures: Vec<String>,
        #[serde(default)]
        allow_value_transfer: bool,
        #[serde(default)]
        allow_approvals: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Lists consulted for every call, in order.
    #[serde(default = "default_lists")]
    pub lists: Vec<ListId>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            lists: default_lists(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lists() -> Vec<ListId> {
    vec![DEFAULT_LIST]
}

impl FilterConfig {
    pub fn build(&self) -> Result<Arc<dyn Filter>, ConfigError> {
        let filter: Arc<dyn Filter> = match self {
            Self::Lido => Arc::new(LidoFilter),
            Self::Curve => Arc::new(CurveFilter),
            Self::Pot => Arc::new(PotFilter),
            Self::DaiJoin => Arc::new(DaiJoinFilter),
            Self::Vat { dai_join, pot } => Arc::new(VatFilter::new(*dai_join, *pot)),
            Self::Selectors {
                signatures,
                allow_value_transfer,
                allow_approvals,
            } => {
                let selectors = signatures
                    .iter()
                    .map(|sig| parse_selector(sig).ok_or_else(|| ConfigError::InvalidSelector(sig.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(
                    SelectorFilter::new(selectors)
                        .with_value_transfer(*allow_value_transfer)
                        .with_approvals(*allow_approvals),
                )
            },
        };
        Ok(filter)
    }
}

impl RegistryConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and check list references.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for list in &self.lists {
            if !seen.insert(list.id) {
                return Err(ConfigError::DuplicateList(list.id));
            }
        }
        match self.executor.lists.iter().find(|id| !seen.contains(*id)) {
            Some(id) => Err(ConfigError::UnknownList(*id)),
            None => Ok(()),
        }
    }
}

impl DappRegistry {
    /// Build a registry holding every list and entry of `config`.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Self::new();
        for list in &config.lists {
            registry.set_list_enabled(list.id, list.enabled);
            if let Some(modules) = &list.maker {
                for (target, filter) in modules.filters() {
                    registry.add_entry(list.id, target, filter);
                }
            }
            for entry in &list.entries {
                registry.add_entry(list.id, entry.target, entry.filter.build()?);
            }
        }
        Ok(registry)
    }
}
