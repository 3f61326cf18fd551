//! # Receipt Printing
//!
//! A receipt is printed after the sale is committed. Printing can fail
//! (paper out, spool dir unwritable) without touching the sale; the till is
//! told through `printed: false` and a warning.
//!
//! ```text
//! checkout commit ──► bills().get(bill_no) ──► Receipt::render()
//!                                                    │
//!                                                    ▼
//!                                     ReceiptPrinter::print()
//!                                       SpoolPrinter: <dir>/receipt-<n>.txt
//! ```

use std::path::PathBuf;

use shopfloor_core::receipt::Receipt;
use thiserror::Error;

use crate::files::write_atomic;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Cannot write receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for rendered receipts.
pub trait ReceiptPrinter: Send + Sync {
    /// Prints the receipt. Returns where it went, for logging.
    fn print(&self, receipt: &Receipt) -> Result<String, PrintError>;
}

/// Writes each receipt as a text file into a spool directory that a print
/// daemon picks up.
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SpoolPrinter { dir: dir.into() }
    }

    pub fn path_for(&self, bill_no: i64) -> PathBuf {
        self.dir.join(format!("receipt-{}.txt", bill_no))
    }
}

impl ReceiptPrinter for SpoolPrinter {
    fn print(&self, receipt: &Receipt) -> Result<String, PrintError> {
        let path = self.path_for(receipt.bill_no);
        write_atomic(&path, receipt.render().as_bytes())?;
        Ok(path.display().to_string())
    }
}
