use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Problem::Table)
                    .if_not_exists()
                    .col(string_len(Problem::Id, 36).primary_key())
                    .col(string_len(Problem::Title, 200))
                    .col(
                        big_integer(Problem::TimeLimitMs)
                            .check(Expr::col(Problem::TimeLimitMs).gt(0)),
                    )
                    .col(
                        big_integer(Problem::MemoryLimitKb)
                            .check(Expr::col(Problem::MemoryLimitKb).gt(0)),
                    )
                    .col(timestamp(Problem::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Problem::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Testcase::Table)
                    .if_not_exists()
                    .col(string_len(Testcase::Id, 36).primary_key())
                    .col(string_len(Testcase::ProblemId, 36))
                    // Testcases are judged in ascending position order.
                    .col(integer(Testcase::Position))
                    .col(text(Testcase::Input))
                    .col(text(Testcase::ExpectedOutput))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-testcase-problem_id")
                            .from(Testcase::Table, Testcase::ProblemId)
                            .to(Problem::Table, Problem::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contest::Table)
                    .if_not_exists()
                    .col(string_len(Contest::Id, 36).primary_key())
                    .col(string_len(Contest::Title, 200))
                    .col(timestamp(Contest::RegistrationStart))
                    .col(timestamp(Contest::StartTime))
                    .col(timestamp(Contest::EndTime))
                    // 0=icpc, 1=ioi, 2=custom
                    .col(
                        small_integer(Contest::ScoringRule)
                            .check(Expr::col(Contest::ScoringRule).gte(0))
                            .check(Expr::col(Contest::ScoringRule).lte(2)),
                    )
                    .col(timestamp_null(Contest::FreezeStart))
                    .col(timestamp_null(Contest::FreezeEnd))
                    .col(boolean(Contest::ResultsPublished).default(false))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Submission::Table)
                    .if_not_exists()
                    .col(string_len(Submission::Id, 36).primary_key())
                    .col(string_len(Submission::ProblemId, 36))
                    .col(string_len_null(Submission::ContestId, 36))
                    .col(string_len(Submission::UserId, 36))
                    // Judge language id: 103=c, 105=cpp, 91=java, 100=python
                    .col(integer(Submission::Language))
                    .col(text(Submission::SourceCode))
                    // 0=pending, 1=accepted, 2=wrong_answer, 3=time_limit_exceed,
                    // 4=memory_limit_exceed, 5=runtime_error, 6=compilation_error, 7=skipped
                    .col(
                        small_integer(Submission::FinalVerdict)
                            .check(Expr::col(Submission::FinalVerdict).gte(0))
                            .check(Expr::col(Submission::FinalVerdict).lte(7)),
                    )
                    // JSON array of per-testcase results, in testcase order.
                    .col(text(Submission::TestcaseResults))
                    .col(double_null(Submission::ExecutionTime))
                    .col(big_integer_null(Submission::MemoryUsed))
                    .col(boolean(Submission::IsPublic).default(true))
                    .col(boolean(Submission::Rejudged).default(false))
                    .col(timestamp(Submission::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Submission::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-submission-problem_id")
                            .from(Submission::Table, Submission::ProblemId)
                            .to(Problem::Table, Problem::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-submission-contest_id")
                            .from(Submission::Table, Submission::ContestId)
                            .to(Contest::Table, Contest::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submission_contest_user")
                    .table(Submission::Table)
                    .col(Submission::ContestId)
                    .col(Submission::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submission_final_verdict")
                    .table(Submission::Table)
                    .col(Submission::FinalVerdict)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submission_created_at")
                    .table(Submission::Table)
                    .col(Submission::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContestLeaderboard::Table)
                    .if_not_exists()
                    .col(string_len(ContestLeaderboard::Id, 36).primary_key())
                    .col(string_len(ContestLeaderboard::ContestId, 36))
                    .col(string_len(ContestLeaderboard::UserId, 36))
                    .col(integer(ContestLeaderboard::Score).default(0))
                    .col(big_integer(ContestLeaderboard::Penalty).default(0))
                    .col(integer(ContestLeaderboard::Rank).default(0))
                    // JSON array of per-problem results.
                    .col(text(ContestLeaderboard::ProblemsSolved))
                    .col(timestamp_null(ContestLeaderboard::LastSubmissionTime))
                    .col(
                        timestamp(ContestLeaderboard::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contest_leaderboard-contest_id")
                            .from(ContestLeaderboard::Table, ContestLeaderboard::ContestId)
                            .to(Contest::Table, Contest::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contest_leaderboard_contest_user")
                    .table(ContestLeaderboard::Table)
                    .col(ContestLeaderboard::ContestId)
                    .col(ContestLeaderboard::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaderboardSnapshot::Table)
                    .if_not_exists()
                    .col(string_len(LeaderboardSnapshot::ContestId, 36).primary_key())
                    .col(timestamp(LeaderboardSnapshot::TakenAt))
                    // JSON array of leaderboard entries as of `taken_at`.
                    .col(text(LeaderboardSnapshot::Entries))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-leaderboard_snapshot-contest_id")
                            .from(LeaderboardSnapshot::Table, LeaderboardSnapshot::ContestId)
                            .to(Contest::Table, Contest::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaderboardSnapshot::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ContestLeaderboard::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Submission::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contest::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Testcase::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Problem::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Problem {
    Table,
    Id,
    Title,
    TimeLimitMs,
    MemoryLimitKb,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Testcase {
    Table,
    Id,
    ProblemId,
    Position,
    Input,
    ExpectedOutput,
}

#[derive(DeriveIden)]
enum Contest {
    Table,
    Id,
    Title,
    RegistrationStart,
    StartTime,
    EndTime,
    ScoringRule,
    FreezeStart,
    FreezeEnd,
    ResultsPublished,
}

#[derive(DeriveIden)]
enum Submission {
    Table,
    Id,
    ProblemId,
    ContestId,
    UserId,
    Language,
    SourceCode,
    FinalVerdict,
    TestcaseResults,
    ExecutionTime,
    MemoryUsed,
    IsPublic,
    Rejudged,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ContestLeaderboard {
    Table,
    Id,
    ContestId,
    UserId,
    Score,
    Penalty,
    Rank,
    ProblemsSolved,
    LastSubmissionTime,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LeaderboardSnapshot {
    Table,
    ContestId,
    TakenAt,
    Entries,
}
