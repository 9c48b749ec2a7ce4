//! Property tests over the command codec, the log reader and recovery.

use graphlog_core::{
    recover, Command, CommandCollector, LogConfig, LogEntry, LogManager, NameBlockEncoder, Output,
    SequenceValidatingOutput, StoreSet, TransactionId,
};
use graphlog_core::log::ENTRY_HEADER_LEN;
use graphlog_core::name_block::blocks_needed;
use graphlog_storage::MemoryBuffer;
use graphlog_testkit::prelude::*;
use proptest::prelude::*;

fn log_with_chunk(chunk: usize) -> LogManager {
    LogManager::with_config(
        Box::new(MemoryBuffer::new()),
        LogConfig::new().sync_on_append(false).read_buffer_size(chunk),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn command_payload_is_self_delimiting(command in command_strategy()) {
        let payload = command.encode_payload().unwrap();
        prop_assert_eq!(Command::decode_payload(&payload).unwrap(), command);

        let mut extended = payload.clone();
        extended.push(0);
        prop_assert!(Command::decode_payload(&extended).is_err());
    }

    #[test]
    fn any_entry_prefix_asks_for_more(entry in log_entry_strategy()) {
        let bytes = entry.encode().unwrap();
        let (decoded, len) = LogEntry::decode(&bytes, 0).unwrap().unwrap();
        prop_assert_eq!(decoded, entry);
        prop_assert_eq!(len, bytes.len());

        for cut in 0..bytes.len() {
            prop_assert!(LogEntry::decode(&bytes[..cut], 0).unwrap().is_none());
        }
    }

    #[test]
    fn flipped_byte_in_complete_entry_is_an_error(
        entry in log_entry_strategy(),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut bytes = entry.encode().unwrap();
        let at = index.index(bytes.len());
        // A damaged length can push the frame past the data; that reads as torn.
        prop_assume!(!(1..ENTRY_HEADER_LEN).contains(&at));
        bytes[at] ^= mask;
        prop_assert!(LogEntry::decode(&bytes, 0).is_err());
    }

    #[test]
    fn chunk_size_does_not_change_what_is_read(
        entries in prop::collection::vec(log_entry_strategy(), 0..12),
        chunk in 1usize..256,
    ) {
        let small = log_with_chunk(chunk);
        let large = log_with_chunk(1 << 20);
        for entry in &entries {
            small.append(entry).unwrap();
            large.append(entry).unwrap();
        }

        let read: Vec<LogEntry> = small.read_all().unwrap().into_iter().map(|(_, e)| e).collect();
        prop_assert_eq!(&read, &entries);
        prop_assert_eq!(small.read_all().unwrap(), large.read_all().unwrap());
    }

    #[test]
    fn token_names_survive_their_chains(name in token_name_strategy(), block_size in 1usize..32) {
        let encoder = NameBlockEncoder::with_block_size(block_size);
        let ids: Vec<u64> = (0..blocks_needed(name.len(), block_size) as u64).collect();
        let blocks = encoder.encode(&name, &ids).unwrap();
        prop_assert!(blocks.iter().all(|b| b.data.len() <= block_size));
        prop_assert_eq!(NameBlockEncoder::decode(&blocks).unwrap(), name);
    }

    #[test]
    fn torn_tails_recover_committed_prefix(
        transactions in prop::collection::vec((prop::collection::vec(0u64..20, 1..4), any::<bool>()), 1..5),
    ) {
        let log = memory_log();
        for (index, (nodes, finish)) in transactions.iter().enumerate() {
            let identifier = index as i32;
            let tx = index as u64 + 1;
            if *finish {
                write_node_transaction(&log, identifier, tx, nodes);
            } else {
                write_unfinished_transaction(&log, identifier, tx, nodes);
            }
        }

        let harness = TornTailHarness::from_log(&log).unwrap();
        for result in harness.check_every_cut() {
            prop_assert!(result.passed, "{}: {:?}", result.description, result);
        }
    }
}

#[test]
fn validated_replay_of_generated_log() {
    let log = memory_log();
    write_node_transaction(&log, 1, 1, &[1, 2, 3]);
    write_delete_transaction(&log, 2, 2, &[2]);

    let mut validator = SequenceValidatingOutput::new(CommandCollector::new());
    for (_, entry) in log.read_all().unwrap() {
        validator.write_entry(entry).unwrap();
    }
    assert!(validator.open_transactions().is_empty());
    assert_eq!(validator.inner().commands().count(), 4);

    let mut stores = StoreSet::in_memory();
    recover(&log, &mut stores, TransactionId::new(0)).unwrap();
    assert_eq!(
        nodes_in_use(&stores, 0..5).into_iter().collect::<Vec<_>>(),
        vec![1, 3]
    );
}
