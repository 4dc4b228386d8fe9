//! Proptest generators for property-based testing.

use proptest::prelude::*;

use proof_of_art_core::{
    ContentHash, Creator, CreatorAddress, NewArtwork, PromptHash, MAX_PROMPT_CHARS,
};

/// Generate a random ContentHash.
pub fn content_hash() -> impl Strategy<Value = ContentHash> {
    any::<[u8; 32]>().prop_map(ContentHash::from_bytes)
}

/// Generate a random PromptHash.
pub fn prompt_hash() -> impl Strategy<Value = PromptHash> {
    any::<[u8; 32]>().prop_map(PromptHash::from_bytes)
}

/// Generate content bytes of at most `max_len`.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a prompt that passes validation.
pub fn prompt() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 1..=MAX_PROMPT_CHARS)
        .prop_map(|chars| chars.into_iter().collect::<String>())
        .prop_filter("blank prompt", |p| !p.trim().is_empty())
}

/// Generate a non-zero wallet address in any letter case.
pub fn creator_address() -> impl Strategy<Value = CreatorAddress> {
    "0x[0-9a-fA-F]{40}".prop_filter_map("zero address", |s| CreatorAddress::parse(&s).ok())
}

/// Generate a creator, mostly wallets.
pub fn creator() -> impl Strategy<Value = Creator> {
    prop_oneof![
        4 => creator_address().prop_map(Creator::Wallet),
        1 => Just(Creator::Anonymous),
    ]
}

/// Generate a model identifier.
pub fn model_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("dall-e-3".to_string()),
        Just("stability-ai".to_string()),
        "bytez:[a-z0-9-]{1,16}/[a-z0-9-]{1,24}".prop_map(String::from),
    ]
}

/// Generate an IPFS CID.
pub fn cid() -> impl Strategy<Value = String> {
    "Qm[1-9A-HJ-NP-Za-km-z]{44}".prop_map(String::from)
}

/// Generate an artwork upsert.
pub fn new_artwork() -> impl Strategy<Value = NewArtwork> {
    (
        content_hash(),
        prompt_hash(),
        creator(),
        cid(),
        model_id(),
        prop::option::of(cid()),
        prop::option::of(1u64..=1_000_000),
    )
        .prop_map(
            |(content_hash, prompt_hash, creator, ipfs_cid, model_used, metadata, token)| {
                NewArtwork {
                    content_hash,
                    prompt_hash,
                    creator,
                    ipfs_cid,
                    model_used,
                    metadata_uri: metadata.map(|cid| format!("ipfs://{cid}")),
                    certificate_token_id: token,
                }
            },
        )
}
