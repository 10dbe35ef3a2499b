//! Record-loading modes and status bucketing.

use super::record::{Status, TaskRecord};
use crate::error::{Error, Result};
use crate::filter::{Filter, FilterExpr};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which buckets of tasks a load request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadCommand {
    #[default]
    All,
    Pending,
    Completed,
}

impl FromStr for LoadCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(LoadCommand::All),
            "pending" => Ok(LoadCommand::Pending),
            "completed" => Ok(LoadCommand::Completed),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

impl LoadCommand {
    /// Bucket names this command fills, in output order.
    pub fn buckets(&self) -> &'static [&'static str] {
        match self {
            LoadCommand::All => &["pending", "completed"],
            LoadCommand::Pending => &["pending"],
            LoadCommand::Completed => &["completed"],
        }
    }

    /// Statuses that land in `bucket`. Waiting tasks count as pending.
    pub fn bucket_statuses(bucket: &str) -> &'static [Status] {
        match bucket {
            "pending" => &[Status::Pending, Status::Waiting],
            "completed" => &[Status::Completed],
            _ => &[],
        }
    }

    /// Export filter selecting the tasks of one bucket.
    pub fn bucket_filter(bucket: &str) -> Filter {
        let members = Self::bucket_statuses(bucket)
            .iter()
            .map(|status| FilterExpr::leaf("status", status.as_str()))
            .collect();
        Filter::new().and(FilterExpr::any(members))
    }

    /// Sort decoded records into this command's buckets.
    ///
    /// Every bucket is present in the result, even when empty. Records whose
    /// status belongs to no bucket are dropped.
    pub fn partition(
        &self,
        records: impl IntoIterator<Item = TaskRecord>,
    ) -> BTreeMap<String, Vec<TaskRecord>> {
        let mut buckets: BTreeMap<String, Vec<TaskRecord>> = self
            .buckets()
            .iter()
            .map(|b| (b.to_string(), Vec::new()))
            .collect();

        for record in records {
            let Some(status) = record.status() else {
                continue;
            };
            if let Some(bucket) = self
                .buckets()
                .iter()
                .find(|b| Self::bucket_statuses(b).contains(&status))
                && let Some(list) = buckets.get_mut(*bucket)
            {
                list.push(record);
            }
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(description: &str, status: Status) -> TaskRecord {
        let mut record = TaskRecord::new(description);
        record.set("status", status).unwrap();
        record
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("all".parse::<LoadCommand>().unwrap(), LoadCommand::All);
        assert_eq!("pending".parse::<LoadCommand>().unwrap(), LoadCommand::Pending);
        assert_eq!("completed".parse::<LoadCommand>().unwrap(), LoadCommand::Completed);
        let err = "foobar".parse::<LoadCommand>().unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(ref c) if c == "foobar"));
    }

    #[test]
    fn test_all_has_two_buckets_even_when_empty() {
        let buckets = LoadCommand::All.partition(Vec::new());
        assert_eq!(buckets.len(), 2);
        assert!(buckets["pending"].is_empty());
        assert!(buckets["completed"].is_empty());
    }

    #[test]
    fn test_partition_merges_waiting_into_pending() {
        let records = vec![
            task("a", Status::Pending),
            task("b", Status::Waiting),
            task("c", Status::Completed),
            task("d", Status::Deleted),
        ];
        let buckets = LoadCommand::All.partition(records);
        assert_eq!(buckets["pending"].len(), 2);
        assert_eq!(buckets["completed"].len(), 1);

        let pending_only = LoadCommand::Pending.partition(vec![task("c", Status::Completed)]);
        assert_eq!(pending_only.len(), 1);
        assert!(pending_only["pending"].is_empty());
    }

    #[test]
    fn test_bucket_filter() {
        let tokens = LoadCommand::bucket_filter("pending").compile().unwrap();
        assert_eq!(tokens, vec!["(", "status:pending", "or", "status:waiting", ")"]);
        let tokens = LoadCommand::bucket_filter("completed").compile().unwrap();
        assert_eq!(tokens, vec!["(", "status:completed", ")"]);
    }
}
