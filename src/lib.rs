//! framestore - a crash-tolerant, append-only framed record file
//!
//! One producer appends length-prefixed records; one consumer replays them
//! in order. When a file is damaged (torn write, crashed process, disk
//! error) the reader reports how many bytes it cannot read instead of
//! failing.
//!
//! ```no_run
//! use framestore::store::{FramedFile, ReadOutcome};
//!
//! let mut out = FramedFile::new("/var/spool/events.dat", true);
//! out.open_append()?;
//! out.append_record(b"hello")?;
//! out.close();
//!
//! let mut input = FramedFile::new("/var/spool/events.dat", true);
//! input.open_read()?;
//! loop {
//!     match input.read_next() {
//!         ReadOutcome::Record(payload) => println!("{} bytes", payload.len()),
//!         ReadOutcome::EndOfStream => break,
//!         ReadOutcome::Corruption(loss) => {
//!             eprintln!("{}", loss);
//!             break;
//!         }
//!     }
//! }
//! # Ok::<(), framestore::store::StoreError>(())
//! ```

pub mod frame;
pub mod observability;
pub mod store;
