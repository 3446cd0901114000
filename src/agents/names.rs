use crate::store::Store;

const ADJECTIVES: &[&str] = &[
    "quiet", "brisk", "amber", "lucid", "nimble", "wry", "placid", "vivid", "hollow", "sly",
    "dusty", "keen", "mellow", "stark", "rusty", "plucky", "sober", "giddy", "feral", "tidy",
];

const ANIMALS: &[&str] = &[
    "otter", "heron", "lynx", "finch", "badger", "marten", "wren", "gecko", "civet", "shrike",
    "stoat", "tapir", "vole", "kite", "serval", "jackal", "mynah", "ferret", "egret", "mantis",
];

/// Deterministic-but-exhaustive quirky-slug generator, attempt-indexed to
/// break collisions (spec §4.3 point 2): `{adjective}-{animal}`, then
/// `{adjective}-{animal}-{n}` starting at the second collision, bounded at
/// 1000 attempts before falling back to a UUID suffix.
pub fn generate_agent_name(store: &Store) -> crate::error::AppResult<String> {
    for attempt in 0..1000usize {
        let adj = ADJECTIVES[attempt % ADJECTIVES.len()];
        let animal = ANIMALS[(attempt / ADJECTIVES.len()) % ANIMALS.len()];
        let candidate = if attempt < ADJECTIVES.len() * ANIMALS.len() {
            format!("{adj}-{animal}")
        } else {
            format!("{adj}-{animal}-{}", attempt)
        };
        if !store.agent_name_exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Ok(format!("agent-{}", uuid::Uuid::new_v4()))
}
