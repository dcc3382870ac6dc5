use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_datetime, parse_detection_type, parse_severity, parse_status, to_score},
    Database,
};
use crate::models::{DetectionEvent, Interview, InterviewStatus};

fn row_to_interview(row: &Row) -> Result<Interview> {
    let scheduled_at: String = row.get("scheduled_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let status: String = row.get("status")?;
    let duration_minutes: i64 = row.get("duration_minutes")?;
    let integrity_score: i64 = row.get("integrity_score")?;

    Ok(Interview {
        id: row.get("id")?,
        title: row.get("title")?,
        interviewer: row.get("interviewer")?,
        candidate: row.get("candidate")?,
        scheduled_at: parse_datetime(&scheduled_at, "scheduled_at")?,
        duration_minutes: u32::try_from(duration_minutes)
            .context("duration_minutes is negative")?,
        status: parse_status(&status)?,
        detection_events: Vec::new(),
        integrity_score: to_score(integrity_score, "integrity_score")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn row_to_event(row: &Row) -> Result<DetectionEvent> {
    let detection_type: String = row.get("type")?;
    let timestamp: String = row.get("timestamp")?;
    let severity: String = row.get("severity")?;

    Ok(DetectionEvent {
        detection_type: parse_detection_type(&detection_type)?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        duration: row.get("duration")?,
        confidence: row.get("confidence")?,
        description: row.get("description")?,
        severity: parse_severity(&severity)?,
    })
}

impl Database {
    pub async fn insert_interview(&self, interview: &Interview) -> Result<()> {
        let record = interview.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO interviews (id, title, interviewer, candidate, scheduled_at, duration_minutes, status, integrity_score, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.title,
                    record.interviewer,
                    record.candidate,
                    record.scheduled_at.to_rfc3339(),
                    i64::from(record.duration_minutes),
                    record.status.as_str(),
                    i64::from(record.integrity_score),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert interview")?;
            Ok(())
        })
        .await
    }

    /// Load an interview with its full event log, oldest event first.
    pub async fn get_interview(&self, interview_id: &str) -> Result<Option<Interview>> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, interviewer, candidate, scheduled_at, duration_minutes, status, integrity_score, created_at, updated_at
                 FROM interviews
                 WHERE id = ?1",
            )?;

            let interview = stmt
                .query_row(params![interview_id], |row| {
                    Ok(row_to_interview(row))
                })
                .optional()?
                .transpose()?;

            let Some(mut interview) = interview else {
                return Ok(None);
            };

            let mut events_stmt = conn.prepare(
                "SELECT type, timestamp, duration, confidence, description, severity
                 FROM detection_events
                 WHERE interview_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = events_stmt.query_map(params![interview.id], |row| Ok(row_to_event(row)))?;
            for row in rows {
                interview.detection_events.push(row??);
            }

            Ok(Some(interview))
        })
        .await
    }

    pub async fn mark_interview_status(
        &self,
        interview_id: &str,
        status: InterviewStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE interviews
                 SET status = ?1,
                     updated_at = ?2
                 WHERE id = ?3",
                params![status.as_str(), updated_at.to_rfc3339(), interview_id],
            )?;
            if changed == 0 {
                anyhow::bail!("interview '{interview_id}' not found");
            }
            Ok(())
        })
        .await
    }

    /// Append accepted events and persist the freshly recomputed score in
    /// one transaction, so the stored score never drifts from the log.
    pub async fn append_detection_events(
        &self,
        interview_id: &str,
        events: Vec<DetectionEvent>,
        integrity_score: u8,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            for event in &events {
                tx.execute(
                    "INSERT INTO detection_events (interview_id, type, timestamp, duration, confidence, description, severity)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        interview_id,
                        event.detection_type.as_str(),
                        event.timestamp.to_rfc3339(),
                        event.duration,
                        event.confidence,
                        event.description,
                        event.severity.as_str(),
                    ],
                )
                .with_context(|| "failed to insert detection event")?;
            }

            let changed = tx.execute(
                "UPDATE interviews
                 SET integrity_score = ?1,
                     updated_at = ?2
                 WHERE id = ?3",
                params![
                    i64::from(integrity_score),
                    updated_at.to_rfc3339(),
                    interview_id
                ],
            )?;
            if changed == 0 {
                anyhow::bail!("interview '{interview_id}' not found");
            }

            tx.commit().context("failed to commit detection events")?;
            Ok(())
        })
        .await
    }
}
