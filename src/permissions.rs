use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::AppError;

/// Permission nodes the client mask calculation recognizes.
pub const NODE_BAT: &str = "bancho.client.bat";
pub const NODE_SUPPORTER: &str = "bancho.client.supporter";
pub const NODE_MODERATOR: &str = "bancho.client.moderator";
pub const NODE_ADMIN: &str = "bancho.client.admin";

/// Client-visible permission bits. NORMAL is the baseline every session
/// gets; the rest are added per granted node.
pub mod client {
    pub const NORMAL: u8 = 1;
    pub const BAT: u8 = 1 << 1;
    pub const SUPPORTER: u8 = 1 << 2;
    pub const MODERATOR: u8 = 1 << 3;
    pub const ADMIN: u8 = 1 << 4;
}

#[derive(Debug, Clone, Default)]
pub struct PermissionGroup {
    pub name: String,
    pub nodes: HashSet<String>,
}

impl PermissionGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashSet::new(),
        }
    }

    pub fn add_node(&mut self, node: &str) {
        self.nodes.insert(node.to_string());
    }
}

/// Resolves group memberships into permission-node sets and the compact
/// client mask. Groups are preloaded at startup and may be added or
/// removed at runtime by collaborators.
#[derive(Default)]
pub struct PermissionEngine {
    groups: RwLock<HashMap<String, PermissionGroup>>,
}

impl PermissionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(groups: HashMap<String, PermissionGroup>) -> Self {
        Self {
            groups: RwLock::new(groups),
        }
    }

    pub fn add_group(&self, group: PermissionGroup) {
        self.groups
            .write()
            .unwrap()
            .insert(group.name.clone(), group);
    }

    pub fn remove_group(&self, name: &str) {
        self.groups.write().unwrap().remove(name);
    }

    /// A referenced group that does not exist is a configuration error,
    /// surfaced to the caller rather than defaulted away.
    pub fn group(&self, name: &str) -> Result<PermissionGroup, AppError> {
        self.groups
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::GroupNotFound(name.to_string()))
    }

    /// Union of every node granted by the named groups. Unknown group
    /// names are reported and skipped.
    pub fn effective_permissions(&self, member_of: &HashSet<String>) -> HashSet<String> {
        let groups = self.groups.read().unwrap();
        let mut nodes = HashSet::new();
        for name in member_of {
            match groups.get(name) {
                Some(group) => nodes.extend(group.nodes.iter().cloned()),
                None => {
                    tracing::error!(group = %name, "membership references unknown permission group");
                }
            }
        }
        nodes
    }

    /// An empty node means "no requirement" and always passes.
    pub fn has_permission(&self, member_of: &HashSet<String>, node: &str) -> bool {
        if node.is_empty() {
            return true;
        }
        self.effective_permissions(member_of).contains(node)
    }

    /// Fold the recognized nodes into the byte-sized mask the client
    /// understands. Baseline NORMAL is always set.
    pub fn calculate_client_permissions(&self, member_of: &HashSet<String>) -> u8 {
        let mut mask = client::NORMAL;
        for node in self.effective_permissions(member_of) {
            match node.as_str() {
                NODE_BAT => mask |= client::BAT,
                NODE_SUPPORTER => mask |= client::SUPPORTER,
                NODE_MODERATOR => mask |= client::MODERATOR,
                NODE_ADMIN => mask |= client::ADMIN,
                _ => {}
            }
        }
        mask
    }
}
