//! Built-in display vocabulary of the admin console.
//!
//! These tables are the fallback behind `DisplayConfig` overrides.

/// Keys whose values are enumerations with display labels.
pub const ENUM_KEYS: [&str; 7] = [
    "type",
    "priority",
    "authorRole",
    "role",
    "projectStatus",
    "projectStepStatus",
    "status",
];

/// Whether values under `key` are shown through an enum label table.
pub fn is_enum_key(key: &str) -> bool {
    ENUM_KEYS.contains(&key)
}

/// Built-in display label of a field.
pub fn field_label(key: &str) -> Option<&'static str> {
    let label = match key {
        "id" => "ID",
        "title" => "제목",
        "content" => "내용",
        "type" => "유형",
        "priority" => "우선순위",
        "status" => "상태",
        "authorId" => "작성자 ID",
        "authorName" => "작성자",
        "authorRole" => "작성자 역할",
        "authorIp" => "작성자 IP",
        "createdAt" => "생성일",
        "changedAt" => "변경일",
        "deadline" => "마감일",
        "attachment" | "attachments" | "files" => "첨부파일",
        "file" => "파일",
        "links" | "link" => "링크",
        "name" => "이름",
        "username" | "loginId" => "아이디",
        "email" => "이메일",
        "phone" | "phoneNumber" => "연락처",
        "role" => "역할",
        "password" => "비밀번호",
        "companyId" => "회사 ID",
        "companyName" => "회사명",
        "businessNumber" => "사업자등록번호",
        "address" => "주소",
        "projectId" => "프로젝트 ID",
        "projectName" => "프로젝트명",
        "projectStatus" => "프로젝트 상태",
        "projectStepId" => "프로젝트 단계 ID",
        "projectStepName" | "stepName" => "단계명",
        "projectStepStatus" => "단계 상태",
        "description" => "설명",
        "startAt" | "startDate" => "시작일",
        "endAt" | "endDate" => "종료일",
        "amount" | "budget" => "금액",
        "parentId" => "상위 글 ID",
        "postId" => "게시글 ID",
        "questionId" => "질문 ID",
        "answer" => "답변",
        "isPrivate" => "비공개",
        "isFixed" | "isPinned" => "상단 고정",
        _ => return None,
    };
    Some(label)
}

/// Built-in display label of an enum value, if one is known.
pub fn enum_label(key: &str, value: &str) -> Option<&'static str> {
    let label = match (key, value) {
        ("type", "QUESTION") => "질문",
        ("type", "NOTICE") => "공지",
        ("type", "REQUEST") => "요청",
        ("type", "FEEDBACK") => "피드백",
        ("type", "REPORT") => "보고",
        ("type", "GENERAL") => "일반",

        ("priority", "URGENT") => "긴급",
        ("priority", "HIGH") => "높음",
        ("priority", "MEDIUM" | "NORMAL") => "보통",
        ("priority", "LOW") => "낮음",

        ("role" | "authorRole", "ADMIN") => "관리자",
        ("role" | "authorRole", "DEVELOPER") => "개발사",
        ("role" | "authorRole", "CLIENT") => "고객사",
        ("role" | "authorRole", "MANAGER") => "매니저",
        ("role" | "authorRole", "USER") => "사용자",

        ("projectStatus", "CONTRACT") => "계약",
        ("projectStatus", "IN_PROGRESS") => "진행 중",
        ("projectStatus", "PAUSED") => "일시 중지",
        ("projectStatus", "COMPLETED") => "완료",
        ("projectStatus", "CANCELLED") => "취소",

        ("projectStepStatus", "NOT_STARTED") => "시작 전",
        ("projectStepStatus", "IN_PROGRESS") => "진행 중",
        ("projectStepStatus", "REVIEW") => "검토 중",
        ("projectStepStatus", "COMPLETED") => "완료",

        ("status", "ACTIVE") => "활성",
        ("status", "INACTIVE") => "비활성",
        ("status", "PENDING") => "대기",
        ("status", "APPROVED") => "승인",
        ("status", "REJECTED") => "반려",
        ("status", "IN_PROGRESS") => "진행 중",
        ("status", "COMPLETED") => "완료",
        ("status", "DELETED") => "삭제됨",
        _ => return None,
    };
    Some(label)
}
