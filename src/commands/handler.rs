//! Command Handler Module
//!
//! Executes parsed [`Command`]s against a shared store.
//!
//! ## Supported Commands
//!
//! - `PING [message]` - Test the console
//! - `SET key value [ttl]` - Set a key, `ttl` in seconds (0 = never expires)
//! - `GET key` - Get a key's value
//! - `DEL key [key ...]` - Delete keys, replies with how many existed
//! - `RANGE start count` - Up to `count` live pairs with keys after `start`
//! - `RECLAIM [max]` - Evict up to `max` expired entries (default 1)
//! - `TTL key` - Seconds left, -1 if persistent, -2 if missing
//! - `DBSIZE` - Number of stored records
//! - `INFO` - Storage statistics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │   parse()   │───>│  execute()  │───>│   Reply     │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                            │                                │
//! │                            ▼                                │
//! │                 Arc<Mutex<KvStorage>>                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::clock::Clock;
use crate::commands::parser::Command;
use crate::commands::reply::Reply;
use crate::storage::{lock, RemainingTtl, SharedStorage};
use std::sync::Arc;
use std::time::Instant;

/// Dispatches console commands to the storage engine.
pub struct CommandHandler<C> {
    /// The shared storage engine
    storage: SharedStorage<C>,
    /// Handler start time for the INFO command
    start_time: Instant,
}

impl<C> Clone for CommandHandler<C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            start_time: self.start_time,
        }
    }
}

impl<C: Clock> CommandHandler<C> {
    /// Creates a new command handler over the given store.
    pub fn new(storage: SharedStorage<C>) -> Self {
        Self {
            storage,
            start_time: Instant::now(),
        }
    }

    /// Parses and executes one line of input.
    ///
    /// Parse failures become error replies. `QUIT` is acknowledged with `OK`;
    /// ending the session is up to the caller.
    pub fn execute_line(&self, line: &str) -> Reply {
        match Command::parse(line) {
            Ok(command) => self.execute(command),
            Err(err) => Reply::from(err),
        }
    }

    /// Executes a command and returns the reply.
    pub fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Ping(None) => Reply::Pong,
            Command::Ping(Some(msg)) => Reply::Value(msg),
            Command::Set {
                key,
                value,
                ttl_secs,
            } => {
                lock(&self.storage).set(&key, value, ttl_secs);
                Reply::Ok
            }
            Command::Get { key } => Reply::from(lock(&self.storage).get(&key)),
            Command::Del { keys } => {
                let mut storage = lock(&self.storage);
                let deleted = keys.iter().filter(|key| storage.remove(key)).count();
                Reply::Integer(deleted as i64)
            }
            Command::Range { start, count } => {
                Reply::Pairs(lock(&self.storage).get_many_sorted(&start, count))
            }
            Command::Reclaim { max } => self.cmd_reclaim(max),
            Command::Ttl { key } => match lock(&self.storage).ttl(&key) {
                Some(RemainingTtl::Expires(secs)) => {
                    Reply::Integer(i64::try_from(secs).unwrap_or(i64::MAX))
                }
                Some(RemainingTtl::Persistent) => Reply::Integer(-1),
                None => Reply::Integer(-2),
            },
            Command::DbSize => Reply::Integer(lock(&self.storage).len() as i64),
            Command::Info => self.cmd_info(),
            Command::Quit => Reply::Ok,
        }
    }

    /// RECLAIM [max]
    fn cmd_reclaim(&self, max: usize) -> Reply {
        let mut storage = lock(&self.storage);
        let mut reclaimed = Vec::new();
        while reclaimed.len() < max {
            match storage.remove_one_expired_entry() {
                Some(pair) => reclaimed.push(pair),
                None => break,
            }
        }
        Reply::Pairs(reclaimed)
    }

    /// INFO
    fn cmd_info(&self) -> Reply {
        let (stats, now) = {
            let storage = lock(&self.storage);
            (storage.stats(), storage.clock().now())
        };
        let uptime = self.start_time.elapsed().as_secs();

        let info = format!(
            "# Server\n\
             ttlkv_version:{}\n\
             os:{}\n\
             uptime_in_seconds:{}\n\
             clock_now:{}\n\
             \n\
             # Keyspace\n\
             keys:{}\n\
             pending_expirations:{}\n\
             \n\
             # Operations\n\
             set_ops:{}\n\
             remove_ops:{}\n\
             reclaimed_keys:{}\n\
             stale_expirations_discarded:{}",
            crate::VERSION,
            std::env::consts::OS,
            uptime,
            now,
            stats.keys,
            stats.pending_expirations,
            stats.set_ops,
            stats.remove_ops,
            stats.reclaimed,
            stats.stale_discarded,
        );

        Reply::Text(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{shared, KvStorage};
    use bytes::Bytes;

    fn create_handler() -> (CommandHandler<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let storage = shared(KvStorage::new(clock.clone()));
        (CommandHandler::new(storage), clock)
    }

    #[test]
    fn test_ping() {
        let (handler, _) = create_handler();

        assert_eq!(handler.execute_line("PING"), Reply::Pong);
        assert_eq!(
            handler.execute_line("PING hello"),
            Reply::Value(Bytes::from("hello"))
        );
    }

    #[test]
    fn test_set_get() {
        let (handler, _) = create_handler();

        assert_eq!(handler.execute_line("SET key value"), Reply::Ok);
        assert_eq!(
            handler.execute_line("GET key"),
            Reply::Value(Bytes::from("value"))
        );
        assert_eq!(handler.execute_line("GET nonexistent"), Reply::Nil);
    }

    #[test]
    fn test_set_with_ttl() {
        let (handler, clock) = create_handler();

        handler.execute_line("SET x v 2");
        clock.advance(1);
        assert_eq!(handler.execute_line("GET x"), Reply::Value(Bytes::from("v")));
        assert_eq!(handler.execute_line("TTL x"), Reply::Integer(1));
        clock.advance(2);
        assert_eq!(handler.execute_line("GET x"), Reply::Nil);
        assert_eq!(handler.execute_line("TTL x"), Reply::Integer(-2));
    }

    #[test]
    fn test_del() {
        let (handler, _) = create_handler();

        handler.execute_line("SET key1 value1");
        handler.execute_line("SET key2 value2");

        assert_eq!(
            handler.execute_line("DEL key1 key2 key3"),
            Reply::Integer(2)
        );
        assert_eq!(handler.execute_line("DEL key1"), Reply::Integer(0));
    }

    #[test]
    fn test_range() {
        let (handler, _) = create_handler();
        for key in ["a", "b", "d", "e"] {
            handler.execute_line(&format!("SET {} v{}", key, key));
        }

        assert_eq!(
            handler.execute_line("RANGE c 2"),
            Reply::Pairs(vec![
                ("d".to_string(), Bytes::from("vd")),
                ("e".to_string(), Bytes::from("ve")),
            ])
        );
        assert_eq!(handler.execute_line("RANGE z 5"), Reply::Pairs(vec![]));
    }

    #[test]
    fn test_reclaim() {
        let (handler, clock) = create_handler();
        handler.execute_line("SET k1 v1 1");
        handler.execute_line("SET k2 v2 1");
        handler.execute_line("SET k3 v3 0");

        assert_eq!(handler.execute_line("RECLAIM"), Reply::Pairs(vec![]));

        clock.advance(2);
        match handler.execute_line("RECLAIM") {
            Reply::Pairs(pairs) => assert_eq!(pairs.len(), 1),
            other => panic!("unexpected reply: {:?}", other),
        }
        match handler.execute_line("RECLAIM 10") {
            Reply::Pairs(pairs) => assert_eq!(pairs.len(), 1),
            other => panic!("unexpected reply: {:?}", other),
        }
        assert_eq!(handler.execute_line("DBSIZE"), Reply::Integer(1));
    }

    #[test]
    fn test_ttl_persistent() {
        let (handler, _) = create_handler();
        handler.execute_line("SET k v");
        assert_eq!(handler.execute_line("TTL k"), Reply::Integer(-1));
    }

    #[test]
    fn test_info() {
        let (handler, _) = create_handler();
        handler.execute_line("SET a 1 5");
        handler.execute_line("SET a 2 5");

        match handler.execute_line("INFO") {
            Reply::Text(info) => {
                assert!(info.contains("keys:1"));
                assert!(info.contains("pending_expirations:2"));
                assert!(info.contains("set_ops:2"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_handlers_share_storage() {
        let (handler, _) = create_handler();
        let other = handler.clone();

        handler.execute_line("SET shared yes");
        assert_eq!(
            other.execute_line("GET shared"),
            Reply::Value(Bytes::from("yes"))
        );
    }

    #[test]
    fn test_errors_become_replies() {
        let (handler, _) = create_handler();

        assert!(handler.execute_line("").is_error());
        assert!(handler.execute_line("GET").is_error());
        assert!(handler.execute_line("NOPE").is_error());
        assert!(handler.execute_line("SET k v soon").is_error());
    }
}
