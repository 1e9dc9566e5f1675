// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries. Each function takes the connection it runs on, so the
//! same query serves both standalone repositories and a unit of work.

pub mod audit;
pub mod cases;
pub mod guild_config;
pub mod reminders;
pub mod staff;
