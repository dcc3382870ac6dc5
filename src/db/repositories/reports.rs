use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    helpers::{parse_datetime, to_score},
    Database,
};
use crate::models::{Deductions, Report};

fn row_to_report(row: &Row) -> Result<Report> {
    let generated_at: String = row.get("generated_at")?;
    let deductions: String = row.get("deductions")?;
    let recommendations: String = row.get("recommendations")?;
    let integrity_score: i64 = row.get("integrity_score")?;
    let interview_duration: i64 = row.get("interview_duration")?;

    let count = |field: &str| -> Result<u32> {
        let value: i64 = row.get(field)?;
        u32::try_from(value).with_context(|| format!("{field} is negative"))
    };

    Ok(Report {
        interview_id: row.get("interview_id")?,
        candidate_name: row.get("candidate_name")?,
        interviewer_name: row.get("interviewer_name")?,
        interview_duration: u32::try_from(interview_duration)
            .context("interview_duration is negative")?,
        total_focus_loss_events: count("total_focus_loss_events")?,
        total_face_absence_events: count("total_face_absence_events")?,
        total_multiple_faces_events: count("total_multiple_faces_events")?,
        total_phone_detections: count("total_phone_detections")?,
        total_notes_detections: count("total_notes_detections")?,
        total_device_detections: count("total_device_detections")?,
        integrity_score: to_score(integrity_score, "integrity_score")?,
        deductions: serde_json::from_str::<Deductions>(&deductions)
            .context("failed to decode deductions")?,
        summary: row.get("summary")?,
        recommendations: serde_json::from_str(&recommendations)
            .context("failed to decode recommendations")?,
        generated_at: parse_datetime(&generated_at, "generated_at")?,
    })
}

impl Database {
    /// Store a generated report. Fails if one already exists for the
    /// interview; callers enforcing create-once should fetch first.
    pub async fn insert_report(&self, report: &Report) -> Result<()> {
        let record = report.clone();
        self.execute(move |conn| {
            let deductions = serde_json::to_string(&record.deductions)
                .context("failed to encode deductions")?;
            let recommendations = serde_json::to_string(&record.recommendations)
                .context("failed to encode recommendations")?;

            conn.execute(
                "INSERT INTO reports (id, interview_id, candidate_name, interviewer_name, interview_duration,
                                      total_focus_loss_events, total_face_absence_events, total_multiple_faces_events,
                                      total_phone_detections, total_notes_detections, total_device_detections,
                                      integrity_score, deductions, summary, recommendations, generated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    Uuid::new_v4().to_string(),
                    record.interview_id,
                    record.candidate_name,
                    record.interviewer_name,
                    i64::from(record.interview_duration),
                    i64::from(record.total_focus_loss_events),
                    i64::from(record.total_face_absence_events),
                    i64::from(record.total_multiple_faces_events),
                    i64::from(record.total_phone_detections),
                    i64::from(record.total_notes_detections),
                    i64::from(record.total_device_detections),
                    i64::from(record.integrity_score),
                    deductions,
                    record.summary,
                    recommendations,
                    record.generated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert report")?;
            Ok(())
        })
        .await
    }

    pub async fn get_report_for_interview(&self, interview_id: &str) -> Result<Option<Report>> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT interview_id, candidate_name, interviewer_name, interview_duration,
                        total_focus_loss_events, total_face_absence_events, total_multiple_faces_events,
                        total_phone_detections, total_notes_detections, total_device_detections,
                        integrity_score, deductions, summary, recommendations, generated_at
                 FROM reports
                 WHERE interview_id = ?1",
            )?;

            stmt.query_row(params![interview_id], |row| Ok(row_to_report(row)))
                .optional()?
                .transpose()
        })
        .await
    }
}
