diesel::table! {
    jobs (id) {
        id -> Integer,
        primary_key -> Text,
        date -> Text,
        resume_similarity -> Float,
        title -> Text,
        company -> Text,
        company_url -> Text,
        location -> Text,
        job_url -> Text,
        description -> Text,
        salary_low -> Nullable<Double>,
        salary_high -> Nullable<Double>,
        job_type -> Nullable<Text>,
        job_is_remote -> Nullable<Text>,
        job_benefits -> Nullable<Text>,
        embeddings -> Nullable<Binary>,
    }
}
