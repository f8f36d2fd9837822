// src/presenter/render.rs
use std::fmt::Write;
use crate::models::server::ServerStatus;
use super::PresenterState;

/// Text rendition of the dashboard, one card per server.
pub fn render(state: &PresenterState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Server Status ==");
    for server in &state.snapshot {
        let copied = state.copied.as_deref() == Some(server.id.as_str());
        render_server(&mut out, server, copied);
    }
    out
}

fn render_server(out: &mut String, server: &ServerStatus, copied: bool) {
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "[{}] {} ({})",
        if server.online { "ONLINE" } else { "OFFLINE" },
        server.name,
        server.id
    );
    let _ = writeln!(out, "  Address: {}{}", server.ip, if copied { "  (copied)" } else { "" });

    if let Some(version) = &server.version {
        let _ = writeln!(out, "  Version: {}", version);
    }
    if let Some(uptime) = &server.uptime {
        let _ = writeln!(out, "  Uptime: {}", uptime);
    }

    if !server.motd.is_empty() {
        let _ = writeln!(out, "  MOTD:");
        for line in &server.motd {
            let _ = writeln!(out, "    {}", line);
        }
    }

    let _ = writeln!(out, "  Players: {}/{}", server.players, server.max_players);

    if !server.online {
        return;
    }
    if !server.player_list.is_empty() {
        let _ = writeln!(out, "  Online ({}):", server.player_list.len());
        for player in &server.player_list {
            let _ = writeln!(out, "    - {}", player);
        }
    } else if server.players > 0 {
        let _ = writeln!(
            out,
            "  {} player{} online (list unavailable)",
            server.players,
            if server.players == 1 { "" } else { "s" }
        );
    } else {
        let _ = writeln!(out, "  No players online");
    }
}
