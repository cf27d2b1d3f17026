use crate::{MatchOptions, OptionTable, Rendezvous};

const INDENT: &str = "    ";

/// Values the launcher injects into `[ModOptions]` on every launch.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub rendezvous: &'a Rendezvous,
    pub write_path: &'a str,
    pub launcher_version: &'a str,
}

/// Renders the `[GAME]` start script for a local two-player bot match.
///
/// Option tables are emitted in insertion order. The four `_sl_*` entries
/// come first in `[ModOptions]`; a caller key with the same name is written
/// after them, so the engine sees the caller's line last.
pub fn render_script(options: &MatchOptions, ctx: &ScriptContext<'_>) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("[GAME]\n{\n");

    push_option(&mut out, "GameType", &options.game);
    push_line(&mut out, "HostIP = 127.0.0.1;");
    push_line(&mut out, "IsHost = 1;");
    push_option(&mut out, "MapName", &options.map);
    push_line(&mut out, "NumPlayers = 2;");
    push_line(&mut out, "NumUsers = 2;");
    push_line(&mut out, "GameStartDelay = 0;");
    out.push('\n');

    if !options.game_options.is_empty() {
        push_options(&mut out, &options.game_options);
        out.push('\n');
    }

    push_line(&mut out, "[allyTeam0] { NumAllies = 0; }");
    push_line(&mut out, "[allyTeam1] { NumAllies = 0; }");
    out.push('\n');

    push_line(&mut out, "[ModOptions]");
    push_line(&mut out, "{");
    push_option(&mut out, "_sl_address", &ctx.rendezvous.address);
    push_option(&mut out, "_sl_port", &ctx.rendezvous.port.to_string());
    push_option(&mut out, "_sl_write_path", ctx.write_path);
    push_option(&mut out, "_sl_launcher_version", ctx.launcher_version);
    push_options(&mut out, &options.mod_options);
    push_line(&mut out, "}");
    out.push('\n');

    if !options.map_options.is_empty() {
        push_line(&mut out, "[MapOptions]");
        push_line(&mut out, "{");
        push_options(&mut out, &options.map_options);
        push_line(&mut out, "}");
        out.push('\n');
    }

    push_line(
        &mut out,
        "[player0] { IsFromDemo = 1; Name = Enemy; Spectator = 0; Team = 1; }",
    );
    push_line(
        &mut out,
        "[player1] { IsFromDemo = 1; Name = 0; Spectator = 0; Team = 0; }",
    );
    push_line(
        &mut out,
        "[team0] { AllyTeam = 0; RGBColor = 0.35294119 0.35294119 1; TeamLeader = 0; }",
    );
    push_line(
        &mut out,
        "[team1] { AllyTeam = 1; RGBColor = 0.78431374 0 0; TeamLeader = 0; }",
    );
    out.push('}');
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(INDENT);
    out.push_str(line);
    out.push('\n');
}

fn push_option(out: &mut String, key: &str, value: &str) {
    push_line(out, &format!("{key} = {value};"));
}

fn push_options(out: &mut String, table: &OptionTable) {
    for (key, value) in table.iter() {
        push_option(out, key, value);
    }
}
