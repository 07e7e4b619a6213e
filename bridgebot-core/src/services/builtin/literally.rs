//! The "literally" death-clip commands: random playback for everyone, clip
//! entry for admins.

use std::sync::Arc;

use bridgebot_common::models::Literally;

use crate::services::adapter::{
    register_common_admin, register_common_anonymous, user_handler, CommonCommandSpec,
};
use crate::services::builtin::BuiltinDeps;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::{handler, CommandCategory};
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let clips = deps.literally.clone();
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "literally",
            category: CommandCategory::General,
            short_description: "You LITERALLY can not die",
            usage: "literally [filter]",
        },
        handler(move |_ctx, param| {
            let clips = clips.clone();
            async move {
                match clips.get_random(param.as_deref()).await? {
                    Some(l) => Ok(format!(
                        "You LITERALLY can not die to {}: {}",
                        l.what, l.clip
                    )),
                    None => Ok(match param {
                        Some(f) => format!("Nothing found for death by {f}!"),
                        None => "No clips found!".to_string(),
                    }),
                }
            }
        }),
    )?;

    let clips = deps.literally.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addliterally",
            category: CommandCategory::Admin,
            short_description: "Save a new 'literally' clip",
            usage: "addliterally <what> | <clip url>",
        },
        user_handler(move |_ctx, _user, param| {
            let clips = clips.clone();
            async move {
                let param = match param {
                    Some(p) => p,
                    None => return Ok("Usage: addliterally <what> | <clip url>".to_string()),
                };
                let (what, clip) = match param.split_once('|') {
                    Some((w, c)) if !w.trim().is_empty() && !c.trim().is_empty() => {
                        (w.trim().to_string(), c.trim().to_string())
                    }
                    _ => return Ok("Usage: addliterally <what> | <clip url>".to_string()),
                };
                if clips.is_duplicate(&what, &clip).await? {
                    return Ok(format!("That clip is already saved for death by {what}!"));
                }
                clips.create(&Literally::new(&what, &clip)).await?;
                Ok(format!("Added clip for death by {what}"))
            }
        }),
    )?;

    Ok(())
}
