//! What a completed cycle leaves behind: forward links on every chain,
//! cumulative tallies, anchor correlation and chain registrations.

mod common;

use chainmirror_core::ZERO_HASH;
use common::{attestation_content, engine_for, minute_marker, ChainSim};

fn scratch_anchor() -> String {
    "9a".repeat(32)
}

// ─── Forward links ────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_predecessor_gains_a_forward_link() {
    let mut sim = ChainSim::new();
    for _ in 0..3 {
        sim.push_height(&[(0, 5_0000_0000)], vec![]);
    }
    let (mut engine, cache) = engine_for(&sim, &scratch_anchor());
    engine.run_cycle().await.unwrap();

    for pair in sim.dirs.windows(2) {
        let dir = cache.directory(&pair[0]).await.unwrap().unwrap();
        assert_eq!(dir.next_hash.as_deref(), Some(pair[1].as_str()));
    }
    let head = cache.directory(&sim.dirs[2]).await.unwrap().unwrap();
    assert!(head.next_hash.is_none());

    // The admin sub-chain is walkable forward from its genesis block.
    let genesis = cache.directory(&sim.dirs[0]).await.unwrap().unwrap();
    let mut hash = genesis.admin_block.hash.clone();
    let mut visited = 1;
    loop {
        let block = cache.block(&hash).await.unwrap().unwrap();
        if visited == 1 {
            assert_eq!(block.prev_hash, ZERO_HASH);
        }
        match block.next_hash {
            Some(next) => {
                hash = next;
                visited += 1;
            }
            None => break,
        }
    }
    assert_eq!(visited, 3);
    assert_eq!(hash, head.admin_block.hash);
}

#[tokio::test]
async fn sub_chains_link_across_the_heights_they_mint_at() {
    let mut sim = ChainSim::new();
    let chain = "ab".repeat(32);
    let first = sim.add_entry(&chain, b"genesis payload", &[b"Project Registry"]);
    sim.push_height(&[], vec![(chain.clone(), vec![first])]);
    sim.push_height(&[], vec![]);
    let later = sim.add_entry(&chain, b"second payload", &[]);
    sim.push_height(&[], vec![(chain.clone(), vec![later])]);

    let (mut engine, cache) = engine_for(&sim, &scratch_anchor());
    engine.run_cycle().await.unwrap();

    // Height 1 minted no block for the chain, so its block at height 0
    // links straight to the one at height 2.
    let d0 = cache.directory(&sim.dirs[0]).await.unwrap().unwrap();
    let d2 = cache.directory(&sim.dirs[2]).await.unwrap().unwrap();
    let genesis = cache.block(&d0.child_blocks[0].hash).await.unwrap().unwrap();
    assert_eq!(
        genesis.next_hash.as_deref(),
        Some(d2.child_blocks[0].hash.as_str())
    );
}

// ─── Tallies ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn the_tally_accumulates_signed_deltas() {
    let mut sim = ChainSim::new();
    sim.push_height(&[(0, 5_0000_0000)], vec![]);
    sim.push_height(&[(10_0000_0000, 9_9999_0000)], vec![]);
    sim.push_height(&[(0, 1_5000_0000), (2_0000_0000, 2_0000_0000)], vec![]);

    let (mut engine, cache) = engine_for(&sim, &scratch_anchor());
    engine.run_cycle().await.unwrap();

    let expected = ["5.00000000", "4.99990000", "6.49990000"];
    for (height, want) in expected.iter().enumerate() {
        let dir = cache
            .directory_by_height(height as u64)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dir.tally.as_deref(), Some(*want));
    }

    // The burn height's transfer block keeps the destroyed sign.
    let burn = cache.directory_by_height(1).await.unwrap().unwrap();
    assert_eq!(burn.transfer_entries, 1);
    let block = cache.block(&burn.transfer_block.hash).await.unwrap().unwrap();
    let totals = block.totals.unwrap();
    assert_eq!(totals.destroyed, "-0.00010000");
    assert_eq!(totals.net_delta, "-0.00010000");

    assert_eq!(
        cache.progress().await.unwrap().last_tallied_height,
        Some(2)
    );
}

// ─── Anchors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn attested_heights_record_their_external_anchor() {
    let mut sim = ChainSim::new();
    let anchor_chain = "df3ade9eec4b08d5379cc64270c30ea7315d8a8a1a69efe2b98a60ecdd69e604";
    let registration = sim.add_entry(anchor_chain, b"external anchor records", &[b"AnchorRecords"]);
    sim.push_height(&[(0, 5_0000_0000)], vec![(anchor_chain.to_string(), vec![registration])]);
    sim.push_height(&[], vec![]);
    let tx_id = "4e".repeat(32);
    let attestation = sim.add_entry(
        anchor_chain,
        &attestation_content(&sim.dirs[1], 1, &tx_id),
        &[],
    );
    sim.push_height(&[], vec![(anchor_chain.to_string(), vec![attestation])]);

    let (mut engine, cache) = engine_for(&sim, anchor_chain);
    engine.run_cycle().await.unwrap();

    let attested = cache.directory(&sim.dirs[1]).await.unwrap().unwrap();
    assert_eq!(attested.anchor_tx.as_deref(), Some(tx_id.as_str()));
    assert!(attested.anchor_entry.is_some());

    // The registration entry is not an attestation and marks nothing; the
    // attesting height itself is not the attested one.
    let genesis = cache.directory(&sim.dirs[0]).await.unwrap().unwrap();
    assert!(genesis.anchor_tx.is_none());
    let tip = cache.directory(&sim.dirs[2]).await.unwrap().unwrap();
    assert!(tip.anchor_tx.is_none());
}

// ─── Chain registration ───────────────────────────────────────────────────────

#[tokio::test]
async fn genesis_blocks_register_their_chain_names() {
    let mut sim = ChainSim::new();
    let chain = "ab".repeat(32);
    let first = sim.add_entry(&chain, b"genesis payload", &[b"Project Registry", b"v2"]);
    sim.push_height(&[], vec![(chain.clone(), vec![first.clone()])]);
    let later = sim.add_entry(&chain, b"second payload", &[]);
    sim.push_height(&[], vec![(chain.clone(), vec![later])]);

    let (mut engine, cache) = engine_for(&sim, &scratch_anchor());
    engine.run_cycle().await.unwrap();

    let registration = cache.chain(&chain).await.unwrap().unwrap();
    assert_eq!(registration.first_entry_id, first);
    assert_eq!(registration.names[0].text, "Project Registry");
    assert_eq!(
        cache.chain_id_by_name("project registry").await.unwrap().as_deref(),
        Some(chain.as_str())
    );
    assert_eq!(cache.entry_ids_for_chain(&chain).await.unwrap().len(), 2);
}

// ─── Minute markers ───────────────────────────────────────────────────────────

#[tokio::test]
async fn minute_markers_backfill_without_becoming_entries() {
    let mut sim = ChainSim::new();
    let chain = "cd".repeat(32);
    let e1 = sim.add_entry(&chain, b"first", &[b"minutes"]);
    let e2 = sim.add_entry(&chain, b"second", &[]);
    let e3 = sim.add_entry(&chain, b"third", &[]);
    sim.push_height(
        &[],
        vec![(
            chain.clone(),
            vec![e1, minute_marker(2), e2, e3, minute_marker(9)],
        )],
    );

    let (mut engine, cache) = engine_for(&sim, &scratch_anchor());
    engine.run_cycle().await.unwrap();

    let dir = cache.directory_by_height(0).await.unwrap().unwrap();
    assert_eq!(dir.entry_entries, 3);

    let block = cache.block(&dir.child_blocks[0].hash).await.unwrap().unwrap();
    assert_eq!(block.entry_count, 3);
    assert_eq!(block.entries.len(), 3);
    assert_eq!(
        block.entries[0].minute_marker.as_deref(),
        Some(minute_marker(2).as_str())
    );
    assert_eq!(
        block.entries[1].minute_marker.as_deref(),
        Some(minute_marker(9).as_str())
    );
    assert_eq!(
        block.entries[2].minute_marker.as_deref(),
        Some(minute_marker(9).as_str())
    );
}
