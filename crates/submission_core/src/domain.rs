//! crates/submission_core/src/domain.rs
//!
//! Defines the core data structures for the submission portal.
//! The same shapes are used for the record store, the `project-info.json`
//! sidecar and the HTTP API, so they carry their serde layout here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Represents one member of a student team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    // Older records stored the student identifier under `id`.
    #[serde(alias = "id", default)]
    pub student_id: String,
}

/// Describes a file that has been placed inside a project folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub path: String,
    pub size: u64,
}

/// The kinds of files a project record can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Readme,
    Installation,
    Source,
    StudentInfo,
}

impl FileKind {
    pub const ALL: [FileKind; 4] = [
        FileKind::Readme,
        FileKind::Installation,
        FileKind::Source,
        FileKind::StudentInfo,
    ];

    /// The key used for this kind in the `files` map and in download URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Readme => "readme",
            FileKind::Installation => "installation",
            FileKind::Source => "source",
            FileKind::StudentInfo => "studentInfo",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown file type '{}'", s))
    }
}

/// The file map of a project record, keyed by `FileKind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<FileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation: Option<FileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_info: Option<FileMetadata>,
}

impl ProjectFiles {
    pub fn get(&self, kind: FileKind) -> Option<&FileMetadata> {
        match kind {
            FileKind::Readme => self.readme.as_ref(),
            FileKind::Installation => self.installation.as_ref(),
            FileKind::Source => self.source.as_ref(),
            FileKind::StudentInfo => self.student_info.as_ref(),
        }
    }

    pub fn set(&mut self, kind: FileKind, metadata: Option<FileMetadata>) {
        let slot = match kind {
            FileKind::Readme => &mut self.readme,
            FileKind::Installation => &mut self.installation,
            FileKind::Source => &mut self.source,
            FileKind::StudentInfo => &mut self.student_info,
        };
        *slot = metadata;
    }

    /// Iterates over the entries that are present.
    pub fn iter(&self) -> impl Iterator<Item = (FileKind, &FileMetadata)> {
        FileKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|meta| (kind, meta)))
    }

    pub fn total_size(&self) -> u64 {
        self.iter().map(|(_, meta)| meta.size).sum()
    }
}

/// A finalized project submission.
///
/// `id` and `timestamp` are assigned once when the record is first created
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub folder_name: String,
    pub project_path: String,
    #[serde(default)]
    pub files: ProjectFiles,
}

/// The fields of a record that may be replaced by an update.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub project_name: Option<String>,
    pub team_members: Option<Vec<TeamMember>>,
    pub folder_name: Option<String>,
    pub project_path: Option<String>,
    pub files: Option<ProjectFiles>,
}

impl ProjectPatch {
    /// A patch that overwrites every mutable field with the values of `record`.
    pub fn replace_with(record: ProjectRecord) -> Self {
        Self {
            project_name: Some(record.project_name),
            team_members: Some(record.team_members),
            folder_name: Some(record.folder_name),
            project_path: Some(record.project_path),
            files: Some(record.files),
        }
    }

    /// Applies the patch. Identity fields are left alone and `last_updated` is stamped.
    pub fn apply_to(self, record: &mut ProjectRecord, now: DateTime<Utc>) {
        if let Some(project_name) = self.project_name {
            record.project_name = project_name;
        }
        if let Some(team_members) = self.team_members {
            record.team_members = team_members;
        }
        if let Some(folder_name) = self.folder_name {
            record.folder_name = folder_name;
        }
        if let Some(project_path) = self.project_path {
            record.project_path = project_path;
        }
        if let Some(files) = self.files {
            record.files = files;
        }
        record.last_updated = Some(now);
    }
}

/// Narrows a search to one field of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    ProjectName,
    TeamMember,
    StudentId,
    FolderName,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projectName" | "project" => Ok(SearchField::ProjectName),
            "teamMember" | "member" | "name" => Ok(SearchField::TeamMember),
            "studentId" | "id" => Ok(SearchField::StudentId),
            "folderName" => Ok(SearchField::FolderName),
            other => Err(format!("Unknown search type '{}'", other)),
        }
    }
}

impl ProjectRecord {
    /// A fresh identifier for a record that is about to be created.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Case-insensitive substring match. `needle` must already be lowercased.
    /// With no field every searchable string is considered.
    pub fn matches_query(&self, needle: &str, field: Option<SearchField>) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        let by_name = || self.team_members.iter().any(|m| hit(&m.name));
        let by_id = || self.team_members.iter().any(|m| hit(&m.student_id));

        match field {
            Some(SearchField::ProjectName) => hit(&self.project_name),
            Some(SearchField::TeamMember) => by_name(),
            Some(SearchField::StudentId) => by_id(),
            Some(SearchField::FolderName) => hit(&self.folder_name),
            None => hit(&self.project_name) || hit(&self.folder_name) || by_name() || by_id(),
        }
    }
}

/// Aggregate numbers over the whole record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_projects: usize,
    pub total_team_members: usize,
    pub average_team_size: f64,
    pub projects_with_readme: usize,
    pub projects_with_installation: usize,
    pub projects_with_source: usize,
    pub total_storage_bytes: u64,
    pub latest_submission: Option<DateTime<Utc>>,
}

impl StoreStats {
    pub fn from_records(records: &[ProjectRecord]) -> Self {
        let total_projects = records.len();
        let total_team_members = records.iter().map(|r| r.team_members.len()).sum();
        let count_with = |kind: FileKind| records.iter().filter(|r| r.files.get(kind).is_some()).count();

        Self {
            total_projects,
            total_team_members,
            average_team_size: if total_projects == 0 {
                0.0
            } else {
                total_team_members as f64 / total_projects as f64
            },
            projects_with_readme: count_with(FileKind::Readme),
            projects_with_installation: count_with(FileKind::Installation),
            projects_with_source: count_with(FileKind::Source),
            total_storage_bytes: records.iter().map(|r| r.files.total_size()).sum(),
            latest_submission: records.iter().map(|r| r.timestamp).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, members: &[(&str, &str)]) -> ProjectRecord {
        ProjectRecord {
            id: ProjectRecord::generate_id(),
            project_name: name.to_string(),
            timestamp: Utc::now(),
            last_updated: None,
            team_members: members
                .iter()
                .map(|(n, id)| TeamMember { name: n.to_string(), student_id: id.to_string() })
                .collect(),
            folder_name: format!("{}_2024-01-01_10-00-00", name.replace(' ', "_")),
            project_path: format!("/tmp/{}", name),
            files: ProjectFiles::default(),
        }
    }

    #[test]
    fn test_query_matches_across_all_fields() {
        let r = record("Library System", &[("Ada Lovelace", "S-100")]);
        assert!(r.matches_query("library", None));
        assert!(r.matches_query("lovelace", None));
        assert!(r.matches_query("s-100", None));
        assert!(!r.matches_query("compiler", None));
    }

    #[test]
    fn test_query_respects_field() {
        let r = record("Library System", &[("Ada Lovelace", "S-100")]);
        assert!(r.matches_query("library", Some(SearchField::ProjectName)));
        assert!(!r.matches_query("library", Some(SearchField::StudentId)));
        assert!(!r.matches_query("library", Some(SearchField::TeamMember)));
        assert!(r.matches_query("ada", Some(SearchField::TeamMember)));
    }

    #[test]
    fn test_patch_keeps_identity() {
        let mut r = record("Library System", &[]);
        let (id, ts) = (r.id.clone(), r.timestamp);
        let mut replacement = record("Library App", &[("Bob", "1")]);
        replacement.id = "other".to_string();

        ProjectPatch::replace_with(replacement).apply_to(&mut r, Utc::now());

        assert_eq!(r.id, id);
        assert_eq!(r.timestamp, ts);
        assert_eq!(r.project_name, "Library App");
        assert_eq!(r.team_members.len(), 1);
        assert!(r.last_updated.is_some());
    }

    #[test]
    fn test_stats_are_consistent() {
        let mut a = record("A", &[("x", "1"), ("y", "2")]);
        a.files.readme = Some(FileMetadata { name: "ReadMe.txt".into(), path: "/a".into(), size: 10 });
        let b = record("B", &[("z", "3")]);
        let records = vec![a, b];

        let stats = StoreStats::from_records(&records);
        let members: usize = records.iter().map(|r| r.team_members.len()).sum();
        assert_eq!(stats.total_projects, records.len());
        assert_eq!(stats.total_team_members, members);
        assert_eq!(stats.projects_with_readme, 1);
        assert_eq!(stats.total_storage_bytes, 10);
        assert_eq!(stats.latest_submission, records.iter().map(|r| r.timestamp).max());
    }

    #[test]
    fn test_legacy_member_id_key() {
        let member: TeamMember = serde_json::from_str(r#"{"name":"Ann","id":"42"}"#).unwrap();
        assert_eq!(member.student_id, "42");
    }

    #[test]
    fn test_file_kind_parsing() {
        assert_eq!("studentInfo".parse::<FileKind>(), Ok(FileKind::StudentInfo));
        assert_eq!("README".parse::<FileKind>(), Ok(FileKind::Readme));
        assert!("binary".parse::<FileKind>().is_err());
    }
}
