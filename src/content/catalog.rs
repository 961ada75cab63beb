use log::debug;

use super::models::SubTopic;

/// Model shown when a topic matches nothing in the catalog (V8 engine)
pub const FALLBACK_MODEL_ID: &str = "eea9d9252ab14298b50699a471dc2cee";

/// Verified 3D models keyed by a lower-case phrase found in topic text
const VERIFIED_MODELS: &[(&str, &str)] = &[
    ("brain", "36870e0970f044a8957b0af3a180a7eb"),
    ("neuron", "36870e0970f044a8957b0af3a180a7eb"),
    ("female reproductive", "6d9b33568caa4eebbd6c875b51e6a488"),
    ("uterus", "6d9b33568caa4eebbd6c875b51e6a488"),
    ("male reproductive", "d66a297de2fd4400a6833417e7185fcf"),
    ("reproductive", "d66a297de2fd4400a6833417e7185fcf"),
    ("liver", "a20686a3e4a54792bfede17ad32f4b1a"),
    ("kidney", "0dea52d6f6a848ab8f2cdc3f5b3ba212"),
    ("renal", "0dea52d6f6a848ab8f2cdc3f5b3ba212"),
    ("stomach", "883a3c7db5df448bb88981e69ba9b7a1"),
    ("digestive", "883a3c7db5df448bb88981e69ba9b7a1"),
    ("lung", "50c877863fe64d11a55044afb79f5664"),
    ("respiratory", "50c877863fe64d11a55044afb79f5664"),
    ("cell", "fabbdeaf2f07493eaf90d6d5eacb26dc"),
    ("membrane", "fabbdeaf2f07493eaf90d6d5eacb26dc"),
    ("atom", "6a283d5b19c34e2b8fcfc6907b231aea"),
    ("molecule", "6a283d5b19c34e2b8fcfc6907b231aea"),
    ("seed", "ba5ad0540c7e4d8991f4450b93c27d2e"),
    ("germination", "ba5ad0540c7e4d8991f4450b93c27d2e"),
    ("flower", "ec27cb8304964ad4b68ce877e2fd505a"),
    ("petal", "ec27cb8304964ad4b68ce877e2fd505a"),
    ("gear", "7ea57b02a5bc40c2adaeffcf795b4202"),
    ("motor", "c79f5fcf8a0043b5baf2d75750349b5f"),
    ("circuit", "c79f5fcf8a0043b5baf2d75750349b5f"),
    ("ktm", "36d3caaa7a564221bf09e888c4bd8d76"),
    ("motorcycle", "36d3caaa7a564221bf09e888c4bd8d76"),
    ("390", "36d3caaa7a564221bf09e888c4bd8d76"),
    ("v8", FALLBACK_MODEL_ID),
    ("engine", FALLBACK_MODEL_ID),
    ("taj mahal", "7b43e635cbfb47719d5a124302b78579"),
    ("monument", "7b43e635cbfb47719d5a124302b78579"),
];

/// Find the model for a topic. Longer keys win, so "female reproductive"
/// beats "reproductive"; equal lengths keep catalog order.
pub fn resolve_model_id(title: &str, description: &str) -> Option<&'static str> {
    let haystack = format!("{} {}", title, description).to_lowercase();

    let mut keys: Vec<&(&str, &str)> = VERIFIED_MODELS.iter().collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    keys.into_iter()
        .find(|(key, _)| haystack.contains(key))
        .map(|(_, id)| *id)
}

/// Set the model id of every topic that matches the catalog; others keep theirs
pub fn attach_model_ids(topics: &mut [SubTopic]) {
    for topic in topics.iter_mut() {
        if let Some(id) = resolve_model_id(&topic.title, &topic.description) {
            debug!("Topic {} '{}' -> model {}", topic.id, topic.title, id);
            topic.sketchfab_id = Some(id.to_string());
        }
    }
}
