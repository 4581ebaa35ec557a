//! Viewer visibility preferences.
//!
//! Every content-listing call passes through here before it reaches caching
//! or the handler. The filter resolves the effective browsing mode and folds
//! the viewer's exclusion lists into the call input, so downstream layers
//! (key derivation included) see one self-contained input that already
//! encodes who is asking.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{BrowsingMode, CallContext, ImageId, TagId, UserId};
use crate::error::CacheError;
use crate::traits::{HiddenTags, PreferenceSource};

const EXCLUDED_TAGS_FIELD: &str = "excludedTagIds";
const EXCLUDED_USERS_FIELD: &str = "excludedUserIds";
const EXCLUDED_IMAGES_FIELD: &str = "excludedImageIds";

/// Exclusion id lists accumulated into a call input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityExclusions {
    pub excluded_tag_ids: Vec<TagId>,
    pub excluded_user_ids: Vec<UserId>,
    pub excluded_image_ids: Vec<ImageId>,
}

/// Resolve the effective browsing mode for a call.
///
/// Viewers without the unrestricted permission (anonymous viewers included)
/// are pinned to [`BrowsingMode::Sfw`], overriding anything the input or the
/// session asked for. Permitted viewers get what they asked for, then the
/// session's ambient mode, then [`BrowsingMode::All`].
pub fn resolve_mode(requested: Option<BrowsingMode>, ctx: &CallContext) -> BrowsingMode {
    let permitted = ctx
        .viewer()
        .is_some_and(|viewer| viewer.can_view_unrestricted);
    if !permitted {
        return BrowsingMode::Sfw;
    }
    requested
        .or(ctx.ambient_mode())
        .unwrap_or(BrowsingMode::All)
}

/// Middleware that rewrites call inputs with visibility data.
pub struct PreferenceFilter {
    source: Arc<dyn PreferenceSource>,
}

impl PreferenceFilter {
    pub fn new(source: Arc<dyn PreferenceSource>) -> Self {
        Self { source }
    }

    /// Produce the filtered input for a call. The caller's input is left
    /// untouched.
    ///
    /// The resolved browsing mode always lands in the output. Outside
    /// [`BrowsingMode::All`] the viewer's exclusion lists are fetched and
    /// appended to whatever exclusions the caller already supplied, without
    /// deduplication; safe-for-work mode additionally folds in the system
    /// moderation baseline. Non-object inputs are treated as empty.
    ///
    /// # Errors
    ///
    /// Fails when any preference lookup fails. Filtering with partial
    /// exclusion data would leak hidden content, so the whole call fails
    /// instead.
    pub async fn apply(&self, input: &Value, ctx: &CallContext) -> Result<Value, CacheError> {
        let requested = input
            .get("browsingMode")
            .and_then(|raw| serde_json::from_value(raw.clone()).ok());
        let mode = resolve_mode(requested, ctx);

        let mut fields = match input {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        fields.insert(
            "browsingMode".to_string(),
            Value::String(mode.as_str().to_string()),
        );

        if mode == BrowsingMode::All {
            debug!(
                request_id = %ctx.request_id(),
                "unrestricted mode, exclusion lookups skipped"
            );
            return Ok(Value::Object(fields));
        }

        let mut exclusions = caller_exclusions(&fields);
        match (ctx.viewer(), mode) {
            (Some(viewer), BrowsingMode::Sfw) => {
                let (tags, users, images, system) = future::try_join4(
                    self.source.hidden_tags(viewer.id),
                    self.source.hidden_users(viewer.id),
                    self.source.hidden_images(viewer.id),
                    self.source.system_hidden_tags(),
                )
                .await?;
                append_viewer_exclusions(&mut exclusions, tags, users, images);
                append_tag_set(&mut exclusions, system);
            }
            (Some(viewer), _) => {
                let (tags, users, images) = future::try_join3(
                    self.source.hidden_tags(viewer.id),
                    self.source.hidden_users(viewer.id),
                    self.source.hidden_images(viewer.id),
                )
                .await?;
                append_viewer_exclusions(&mut exclusions, tags, users, images);
            }
            (None, BrowsingMode::Sfw) => {
                let system = self.source.system_hidden_tags().await?;
                append_tag_set(&mut exclusions, system);
            }
            (None, _) => {}
        }

        debug!(
            request_id = %ctx.request_id(),
            mode = mode.as_str(),
            excluded_tags = exclusions.excluded_tag_ids.len(),
            excluded_users = exclusions.excluded_user_ids.len(),
            excluded_images = exclusions.excluded_image_ids.len(),
            "exclusions folded into input"
        );

        fields.insert(
            EXCLUDED_TAGS_FIELD.to_string(),
            Value::from(exclusions.excluded_tag_ids),
        );
        fields.insert(
            EXCLUDED_USERS_FIELD.to_string(),
            Value::from(exclusions.excluded_user_ids),
        );
        fields.insert(
            EXCLUDED_IMAGES_FIELD.to_string(),
            Value::from(exclusions.excluded_image_ids),
        );
        Ok(Value::Object(fields))
    }
}

/// Exclusions the caller already had in the input.
fn caller_exclusions(fields: &Map<String, Value>) -> VisibilityExclusions {
    VisibilityExclusions {
        excluded_tag_ids: id_list(fields, EXCLUDED_TAGS_FIELD),
        excluded_user_ids: id_list(fields, EXCLUDED_USERS_FIELD),
        excluded_image_ids: id_list(fields, EXCLUDED_IMAGES_FIELD),
    }
}

fn id_list(fields: &Map<String, Value>, field: &str) -> Vec<u64> {
    fields
        .get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default()
}

fn append_viewer_exclusions(
    exclusions: &mut VisibilityExclusions,
    tags: HiddenTags,
    users: Vec<UserId>,
    images: Vec<ImageId>,
) {
    append_tag_set(exclusions, tags);
    exclusions.excluded_user_ids.extend(users);
    // Hidden image ids belong in the image list, never the user list.
    exclusions.excluded_image_ids.extend(images);
}

fn append_tag_set(exclusions: &mut VisibilityExclusions, tags: HiddenTags) {
    exclusions.excluded_tag_ids.extend(tags.hidden);
    exclusions.excluded_tag_ids.extend(tags.moderated);
}

/// Preference source with fixed answers.
///
/// The builder's default, and the base for test fixtures. Every viewer gets
/// the same sets.
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences {
    pub hidden_tags: HiddenTags,
    pub hidden_users: Vec<UserId>,
    pub hidden_images: Vec<ImageId>,
    pub system_tags: HiddenTags,
}

#[async_trait]
impl PreferenceSource for StaticPreferences {
    async fn hidden_tags(&self, _user: UserId) -> Result<HiddenTags, CacheError> {
        Ok(self.hidden_tags.clone())
    }

    async fn hidden_users(&self, _user: UserId) -> Result<Vec<UserId>, CacheError> {
        Ok(self.hidden_users.clone())
    }

    async fn hidden_images(&self, _user: UserId) -> Result<Vec<ImageId>, CacheError> {
        Ok(self.hidden_images.clone())
    }

    async fn system_hidden_tags(&self) -> Result<HiddenTags, CacheError> {
        Ok(self.system_tags.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Viewer;

    #[test]
    fn anonymous_viewers_are_pinned_to_sfw() {
        let ctx = CallContext::anonymous().with_ambient_mode(BrowsingMode::All);

        assert_eq!(
            resolve_mode(Some(BrowsingMode::Nsfw), &ctx),
            BrowsingMode::Sfw
        );
        assert_eq!(resolve_mode(None, &ctx), BrowsingMode::Sfw);
    }

    #[test]
    fn unpermitted_viewers_are_pinned_to_sfw() {
        let ctx = CallContext::for_viewer(Viewer::new(7));

        assert_eq!(
            resolve_mode(Some(BrowsingMode::All), &ctx),
            BrowsingMode::Sfw
        );
    }

    #[test]
    fn permitted_viewers_get_request_then_ambient_then_all() {
        let plain = CallContext::for_viewer(Viewer::unrestricted(7));
        assert_eq!(
            resolve_mode(Some(BrowsingMode::Nsfw), &plain),
            BrowsingMode::Nsfw
        );
        assert_eq!(resolve_mode(None, &plain), BrowsingMode::All);

        let session = CallContext::for_viewer(Viewer::unrestricted(7))
            .with_ambient_mode(BrowsingMode::Sfw);
        assert_eq!(resolve_mode(None, &session), BrowsingMode::Sfw);
        assert_eq!(
            resolve_mode(Some(BrowsingMode::All), &session),
            BrowsingMode::All
        );
    }

    #[test]
    fn caller_exclusions_ignore_malformed_entries() {
        let fields = serde_json::json!({
            "excludedTagIds": [1, "two", 3, null],
            "excludedUserIds": "not a list",
        });
        let Value::Object(fields) = fields else {
            unreachable!()
        };

        let exclusions = caller_exclusions(&fields);

        assert_eq!(exclusions.excluded_tag_ids, vec![1, 3]);
        assert!(exclusions.excluded_user_ids.is_empty());
        assert!(exclusions.excluded_image_ids.is_empty());
    }
}
