//! End-to-end chat scenarios over in-memory streams.

mod common;

use std::{sync::Arc, time::Duration};

use parley_server::{
    actor::Directory,
    config::ServerConfig,
    domain::Capability,
    session::{SessionError, serve_connection},
};
use parley_shared::time::FixedClock;
use tokio::{
    io::{DuplexStream, ReadHalf, WriteHalf},
    task::JoinHandle,
};

use common::{FIXED_MILLIS, TestClient, chat_line, joined_line};

type DuplexClient = TestClient<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

struct Chat {
    directory: Capability,
    config: ServerConfig,
}

impl Chat {
    fn start(config: ServerConfig) -> Self {
        let directory = Directory::spawn(config, Arc::new(FixedClock::new(FIXED_MILLIS)));
        Self { directory, config }
    }

    fn connect(&self) -> (DuplexClient, JoinHandle<Result<(), SessionError>>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handle = tokio::spawn(serve_connection(
            server,
            self.directory.clone(),
            self.config,
            Arc::new(FixedClock::new(FIXED_MILLIS)),
        ));
        let (read, write) = tokio::io::split(client);
        (TestClient::new(read, write), handle)
    }

    async fn login(&self, name: &str) -> DuplexClient {
        let (mut client, _handle) = self.connect();
        client.login(name).await;
        client
    }
}

#[tokio::test]
async fn test_member_receives_own_message_with_room_and_timestamp() {
    // テスト項目: ルームに参加したユーザーが送信したメッセージは、ルーム名・時刻・送信者付きで本人にも届く
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;
    alice.join("general").await;

    // when (操作):
    alice.send("?general hello").await;

    // then (期待する結果):
    let line = alice.line().await;
    assert_eq!(line, chat_line("general", "alice", "hello"));
    assert!(line.contains("2023-01-01T00:00:00"));
}

#[tokio::test]
async fn test_join_unknown_room_suggests_create() {
    // テスト項目: 存在しないルームへの参加は、作成方法を案内するエラーになる
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut bob = chat.login("bob").await;

    // when (操作):
    bob.send("?join ghost").await;

    // then (期待する結果):
    let line = bob.line().await;
    assert!(line.starts_with("Error: room does not exist"));
    assert!(line.contains("?create ghost"));
}

#[tokio::test]
async fn test_message_is_broadcast_to_every_member() {
    // テスト項目: メッセージは送信者を含むルームの全メンバーに届き、非メンバーには届かない
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    let mut bob = chat.login("bob").await;
    let mut carol = chat.login("carol").await;
    alice.create("general").await;
    alice.join("general").await;
    bob.join("general").await;

    // when (操作):
    bob.send("?general hi all").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, chat_line("general", "bob", "hi all"));
    assert_eq!(bob.line().await, chat_line("general", "bob", "hi all"));
    carol.assert_silent().await;
}

#[tokio::test]
async fn test_late_joiner_receives_history_after_joined_notice() {
    // テスト項目: 後から参加したユーザーには参加通知の後に過去のメッセージが順番に届く
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;
    alice.join("general").await;
    alice.send("?general first").await;
    alice.line().await;
    alice.send("?general second").await;
    alice.line().await;

    // when (操作):
    let mut bob = chat.login("bob").await;
    bob.join("general").await;

    // then (期待する結果):
    assert_eq!(bob.line().await, chat_line("general", "alice", "first"));
    assert_eq!(bob.line().await, chat_line("general", "alice", "second"));
    bob.assert_silent().await;
}

#[tokio::test]
async fn test_logout_without_leave_stops_delivery() {
    // テスト項目: ルームから退出せずにログアウトしても、以後のメッセージは届かず名前は再利用できる
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let (mut alice, alice_session) = chat.connect();
    alice.login("alice").await;
    let mut bob = chat.login("bob").await;
    alice.create("general").await;
    alice.join("general").await;
    bob.join("general").await;

    // when (操作):
    alice.send("?logout").await;

    // then (期待する結果):
    assert_eq!(
        alice.line().await,
        "Exit: Session has been disconnected. Close window."
    );
    assert!(alice.closed().await);
    assert!(alice_session.await.unwrap().is_ok());

    bob.send("?general anyone?").await;
    assert_eq!(bob.line().await, chat_line("general", "bob", "anyone?"));

    let mut alice_again = chat.login("alice").await;
    alice_again.assert_silent().await;
    alice_again.send("?general back").await;
    assert!(alice_again.line().await.starts_with("Error: not a member of 'general'"));
}

#[tokio::test]
async fn test_hang_up_releases_name() {
    // テスト項目: 接続が切れたユーザーの名前は解放され、再ログインできる
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let (alice, alice_session) = chat.connect();
    let mut alice = alice;
    alice.login("alice").await;

    // when (操作):
    drop(alice);
    assert!(alice_session.await.unwrap().is_ok());

    // then (期待する結果):
    let mut again = chat.login("alice").await;
    again.assert_silent().await;
}

#[tokio::test]
async fn test_post_to_unjoined_room_is_rejected_locally() {
    // テスト項目: 参加していないルームへの投稿はエラーになり、ルームには届かない
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    let mut bob = chat.login("bob").await;
    alice.create("general").await;
    alice.join("general").await;

    // when (操作):
    bob.send("?general sneaky").await;

    // then (期待する結果):
    assert!(bob.line().await.starts_with("Error: not a member of 'general'"));
    alice.assert_silent().await;
}

#[tokio::test]
async fn test_duplicate_join_is_rejected() {
    // テスト項目: 同じルームへの二重参加はエラーになり、メッセージは一度だけ届く
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;
    alice.join("general").await;

    // when (操作):
    alice.send("?join general").await;

    // then (期待する結果):
    assert!(alice.line().await.starts_with("Error: already a member of 'general'"));
    alice.send("?general once").await;
    assert_eq!(alice.line().await, chat_line("general", "alice", "once"));
    alice.assert_silent().await;
}

#[tokio::test]
async fn test_duplicate_create_suggests_join() {
    // テスト項目: 既存ルームの作成はエラーになり、参加方法が案内される
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;

    // when (操作):
    alice.send("?create general").await;

    // then (期待する結果):
    let line = alice.line().await;
    assert!(line.starts_with("Error: chatroom already exists"));
    assert!(line.contains("?join general"));
}

#[tokio::test]
async fn test_list_rooms_sorted() {
    // テスト項目: ルーム一覧は見出しに続いて名前順に表示される
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("rust").await;
    alice.create("go").await;

    // when (操作):
    alice.send("?list").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, "Available rooms");
    assert_eq!(alice.line().await, "go");
    assert_eq!(alice.line().await, "rust");
    alice.assert_silent().await;
}

#[tokio::test]
async fn test_help_lists_every_command() {
    // テスト項目: ヘルプは全コマンドの使い方を表示する
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;

    // when (操作):
    alice.send("?help").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, "Usage instructions");
    let mut usage = Vec::new();
    for _ in 0..common::HELP_LINES - 1 {
        usage.push(alice.line().await);
    }
    for command in ["?create", "?list", "?join", "?leave", "?logout", "?help"] {
        assert!(
            usage.iter().any(|line| line.starts_with(command)),
            "missing {}",
            command
        );
    }
}

#[tokio::test]
async fn test_leave_stops_delivery_to_that_member() {
    // テスト項目: ルームから退出すると、以後そのルームのメッセージは届かず投稿もできない
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    let mut bob = chat.login("bob").await;
    alice.create("general").await;
    alice.join("general").await;
    bob.join("general").await;

    // when (操作):
    bob.send("?leave general").await;

    // then (期待する結果):
    assert_eq!(bob.line().await, "general: You have left chatroom");
    alice.send("?general still here?").await;
    assert_eq!(alice.line().await, chat_line("general", "alice", "still here?"));
    bob.assert_silent().await;
    bob.send("?general hello").await;
    assert!(bob.line().await.starts_with("Error: not a member of 'general'"));
}

#[tokio::test]
async fn test_leave_unjoined_room_is_an_error() {
    // テスト項目: 参加していないルームからの退出はエラーになる
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;

    // when (操作):
    alice.send("?leave general").await;

    // then (期待する結果):
    assert!(alice.line().await.starts_with("Error: not a member of 'general'"));
}

#[tokio::test]
async fn test_name_in_use_rejects_second_login() {
    // テスト項目: 使用中の名前でのログインは拒否され、その接続は終了する
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let _alice = chat.login("alice").await;
    let (mut impostor, session) = chat.connect();

    // when (操作):
    impostor.send("alice").await;

    // then (期待する結果):
    assert!(impostor.line().await.starts_with("Error: name in use"));
    assert!(impostor.closed().await);
    assert!(matches!(
        session.await.unwrap(),
        Err(SessionError::LoginRejected(_))
    ));
}

#[tokio::test]
async fn test_capacity_rejects_extra_client() {
    // テスト項目: 最大クライアント数に達するとそれ以上のログインは拒否される
    // given (前提条件):
    let chat = Chat::start(ServerConfig {
        max_clients: 2,
        ..ServerConfig::default()
    });
    let _alice = chat.login("alice").await;
    let _bob = chat.login("bob").await;
    let (mut carol, _session) = chat.connect();

    // when (操作):
    carol.send("carol").await;

    // then (期待する結果):
    assert!(carol.line().await.starts_with("Error: capacity exceeded"));
}

#[tokio::test]
async fn test_second_login_on_same_connection_is_rejected() {
    // テスト項目: ログイン済みの接続で再度ログインするとエラーになる
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;

    // when (操作):
    alice.send("?login bob").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, "Error: already logged in as 'alice'");
}

#[tokio::test]
async fn test_line_without_prefix_is_an_error() {
    // テスト項目: "?" で始まらない行はエラーになり、セッションは継続する
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;

    // when (操作):
    alice.send("hello").await;

    // then (期待する結果):
    assert!(alice.line().await.starts_with("Error: "));
    alice.send("?list").await;
    assert_eq!(alice.line().await, "Available rooms");
}

#[tokio::test]
async fn test_expired_room_notifies_members_and_drops_membership() {
    // テスト項目: 期限切れのルームはメンバーに通知され、以後そのルームには投稿できない
    // given (前提条件):
    let chat = Chat::start(ServerConfig {
        room_lifetime: Duration::from_millis(300),
        ..ServerConfig::default()
    });
    let mut alice = chat.login("alice").await;
    alice.create("general").await;
    alice.join("general").await;

    // when (操作):
    let line = alice.line().await;

    // then (期待する結果):
    assert_eq!(
        line,
        format!("[general {}] room has expired", common::FIXED_RFC3339)
    );
    alice.send("?general too late").await;
    assert!(alice.line().await.starts_with("Error: not a member of 'general'"));
}

#[tokio::test]
async fn test_joined_notice_precedes_first_post() {
    // テスト項目: 参加直後の投稿も確実にルームへ届く
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;

    // when (操作):
    alice.send("?join general").await;
    assert_eq!(alice.line().await, joined_line("general"));
    alice.send("?general right away").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, chat_line("general", "alice", "right away"));
}

#[tokio::test]
async fn test_post_pipelined_after_join_reaches_room() {
    // テスト項目: 参加要求の直後に続けて送った投稿も、参加完了後にルームへ届く
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;
    alice.create("general").await;

    // when (操作):
    alice.send("?join general\n?general hello").await;

    // then (期待する結果):
    assert_eq!(alice.line().await, joined_line("general"));
    assert_eq!(alice.line().await, chat_line("general", "alice", "hello"));
    alice.assert_silent().await;
}

#[tokio::test]
async fn test_input_resumes_after_refused_join() {
    // テスト項目: 参加が拒否された後も、続けて送った行は順番どおり処理される
    // given (前提条件):
    let chat = Chat::start(ServerConfig::default());
    let mut alice = chat.login("alice").await;

    // when (操作):
    alice.send("?join ghost\n?ghost hi\n?list").await;

    // then (期待する結果):
    assert!(alice.line().await.starts_with("Error: room does not exist"));
    assert!(alice.line().await.starts_with("Error: not a member of 'ghost'"));
    assert_eq!(alice.line().await, "Available rooms");
}
