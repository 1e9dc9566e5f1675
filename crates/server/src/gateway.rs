// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Discord side effects for a server running without a bot connection.
//!
//! Every channel operation is logged and reported as successful, so the
//! command pipeline can be exercised end to end over HTTP.

use anarchy::{CaseChannelGateway, ClientNotifier, GatewayError};
use anarchy_domain::{Case, ChannelId, GuildId, UserId};
use tracing::info;

/// Channel gateway and client notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDiscord;

impl CaseChannelGateway for LoggingDiscord {
    fn create_case_channel(
        &self,
        case: &Case,
        category_id: Option<&ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        let channel_id: ChannelId = ChannelId::new(&format!("case-{}", case.id));
        info!(
            guild_id = %case.guild_id,
            case_number = %case.case_number,
            channel_id = %channel_id,
            category_id = ?category_id.map(ChannelId::as_str),
            "Created case channel"
        );
        Ok(channel_id)
    }

    fn delete_channel(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
    ) -> Result<(), GatewayError> {
        info!(guild_id = %guild_id, channel_id = %channel_id, "Deleted channel");
        Ok(())
    }

    fn archive_channel(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        archive_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        info!(
            guild_id = %guild_id,
            channel_id = %channel_id,
            category_id = ?archive_category_id.map(ChannelId::as_str),
            "Archived channel"
        );
        Ok(())
    }

    fn restore_channel(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        review_category_id: Option<&ChannelId>,
    ) -> Result<(), GatewayError> {
        info!(
            guild_id = %guild_id,
            channel_id = %channel_id,
            category_id = ?review_category_id.map(ChannelId::as_str),
            "Restored channel"
        );
        Ok(())
    }

    fn grant_access(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        info!(
            guild_id = %guild_id,
            channel_id = %channel_id,
            user_id = %user_id,
            "Granted channel access"
        );
        Ok(())
    }

    fn revoke_access(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), GatewayError> {
        info!(
            guild_id = %guild_id,
            channel_id = %channel_id,
            user_id = %user_id,
            "Revoked channel access"
        );
        Ok(())
    }
}

impl ClientNotifier for LoggingDiscord {
    fn notify_client(
        &self,
        guild_id: &GuildId,
        client_id: &UserId,
        message: &str,
    ) -> Result<(), GatewayError> {
        info!(
            guild_id = %guild_id,
            client_id = %client_id,
            notification = message,
            "Notified client"
        );
        Ok(())
    }
}
