// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writes. Like the queries, every function takes the connection it runs on.

pub mod audit;
pub mod cases;
pub mod counters;
pub mod guild_config;
pub mod reminders;
pub mod staff;
