// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HISTORY retention on the consumer side.
//!
//! ```text
//! KEEP_LAST(3):  append 1..5  ->  [3] [4] [5]      (1, 2 evicted)
//! KEEP_ALL(3):   append 1..5  ->  [1] [2] [3]      (4, 5 rejected)
//! ```

mod window;

pub use window::{HistoryPolicy, HistoryWindow};
