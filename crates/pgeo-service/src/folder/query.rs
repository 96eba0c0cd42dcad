//! Read-only folder queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pgeo_core::result::AppResult;
use pgeo_database::{FolderFilter, ParentFilter, ZoneFilter};
use pgeo_entity::folder::FolderView;

use super::service::FolderService;

/// Criteria for [`FolderService::channel_folders`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderQuery {
    /// Whether to look at zoned folders when no zone is given.
    pub in_zone: Option<bool>,
    /// Restrict to this zone.
    pub zone_id: Option<Uuid>,
    /// Restrict to enabled or disabled folders.
    pub enabled: Option<bool>,
    /// Restrict to a folder type.
    pub folder_type: Option<Uuid>,
}

impl FolderQuery {
    /// A given zone wins; otherwise `in_zone = true` selects every zoned
    /// folder and anything else selects folders without a zone.
    pub fn zone_filter(&self) -> ZoneFilter {
        match (self.zone_id, self.in_zone) {
            (Some(zone), _) => ZoneFilter::In(zone),
            (None, Some(true)) => ZoneFilter::Zoned,
            (None, _) => ZoneFilter::Unzoned,
        }
    }

    fn filter(&self) -> FolderFilter {
        FolderFilter {
            zone: self.zone_filter(),
            parent: ParentFilter::Any,
            enabled: self.enabled,
            folder_type: self.folder_type,
        }
    }
}

fn zone_of(zone_id: Option<Uuid>) -> ZoneFilter {
    zone_id.map(ZoneFilter::In).unwrap_or(ZoneFilter::Unzoned)
}

impl FolderService {
    /// Folders of a zone, or folders without zone when `zone_id` is `None`.
    pub async fn find_by_zone(
        &self,
        zone_id: Option<Uuid>,
        enabled: Option<bool>,
    ) -> AppResult<Vec<FolderView>> {
        self.query_views(FolderFilter {
            zone: zone_of(zone_id),
            enabled,
            ..FolderFilter::default()
        })
        .await
    }

    /// Like [`find_by_zone`](Self::find_by_zone), restricted to the
    /// children of `parent_id`, or to roots when it is `None`.
    pub async fn find_by_zone_and_parent(
        &self,
        zone_id: Option<Uuid>,
        parent_id: Option<Uuid>,
        enabled: Option<bool>,
    ) -> AppResult<Vec<FolderView>> {
        self.query_views(FolderFilter {
            zone: zone_of(zone_id),
            parent: parent_id.map(ParentFilter::Under).unwrap_or(ParentFilter::Root),
            enabled,
            folder_type: None,
        })
        .await
    }

    /// Folders whose derived classification is channel.
    pub async fn channel_folders(&self, query: &FolderQuery) -> AppResult<Vec<FolderView>> {
        let views = self.query_views(query.filter()).await?;
        Ok(views.into_iter().filter(|view| view.is_channel).collect())
    }

    /// Enabled root folders of a type.
    pub async fn root_folders_by_type(&self, type_id: Uuid) -> AppResult<Vec<FolderView>> {
        self.query_views(FolderFilter {
            parent: ParentFilter::Root,
            enabled: Some(true),
            folder_type: Some(type_id),
            ..FolderFilter::default()
        })
        .await
    }

    /// Every enabled root folder.
    pub async fn root_folders(&self) -> AppResult<Vec<FolderView>> {
        self.query_views(FolderFilter {
            parent: ParentFilter::Root,
            enabled: Some(true),
            ..FolderFilter::default()
        })
        .await
    }

    /// Every folder of a type, at any depth.
    pub async fn find_folders_by_type(&self, type_id: Uuid) -> AppResult<Vec<FolderView>> {
        self.query_views(FolderFilter {
            folder_type: Some(type_id),
            ..FolderFilter::default()
        })
        .await
    }
}
