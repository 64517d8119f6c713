use anyhow::Context;
use ow_api::Player;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub battle_tag: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl RosterEntry {
    pub fn new(battle_tag: &str) -> Self {
        Self {
            battle_tag: battle_tag.to_owned(),
            platform: None,
            region: None,
        }
    }

    pub fn player(&self) -> Player {
        Player::new(
            self.battle_tag.as_str(),
            self.platform.as_deref(),
            self.region.as_deref(),
        )
    }
}

/// The group of players a run collects stats for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Roster {
    pub players: Vec<RosterEntry>,
}

impl Default for Roster {
    fn default() -> Self {
        let mut players = vec![RosterEntry {
            battle_tag: "ghavek#1129".into(),
            platform: Some("pc".into()),
            region: Some("us".into()),
        }];
        players.extend(
            [
                "Problem#1389",
                "CAIRO#11674",
                "Ropenhagen#1408",
                "Atothendrew#1548",
                "JustEpiC#11564",
                "Crazyeye#1402",
                "WoodEngy#1597",
                "Nothingg#11382",
                "Solution#11404",
            ]
            .into_iter()
            .map(RosterEntry::new),
        );
        Self { players }
    }
}

impl Roster {
    /// Load a roster file shaped `{"players": [{"battle_tag": "..."}]}`.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read roster {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid roster json at {}", path.display()))
    }

    pub fn players(&self) -> Vec<Player> {
        self.players.iter().map(RosterEntry::player).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
