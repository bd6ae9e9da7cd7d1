use collab_chat_server::Server;
use collab_chat_server::codec::{escape, unescape};
use collab_chat_server::config::Config;
use collab_chat_server::event::{ChatLine, CodeSessionEvent, Event};
use collab_chat_server::executor::CodeExecutor;
use collab_chat_server::executor::languages::Language;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

struct TestServer {
    chat: SocketAddr,
    http: SocketAddr,
    _data: TempDir,
}

async fn start() -> TestServer {
    start_with_executor(CodeExecutor::default()).await
}

async fn start_with_executor(executor: CodeExecutor) -> TestServer {
    let data = tempfile::tempdir().unwrap();
    let config = Config {
        port: 0,
        http_port: 0,
        database_url: data.path().join("chat.db").to_string_lossy().into_owned(),
        ..Config::default()
    };

    let server = Server::bind_with_executor(config, executor).await.unwrap();
    let chat = server.chat_addr().unwrap();
    let http = server.http_addr().unwrap();
    tokio::spawn(server.run());

    TestServer {
        chat,
        http,
        _data: data,
    }
}

struct Client {
    rd: BufReader<OwnedReadHalf>,
    wr: OwnedWriteHalf,
}

impl Client {
    async fn raw(addr: SocketAddr) -> Client {
        let (rd, wr) = TcpStream::connect(addr).await.unwrap().into_split();
        Client {
            rd: BufReader::new(rd),
            wr,
        }
    }

    /// Connects and reads through the welcome records
    async fn join(addr: SocketAddr, name: &str) -> Client {
        let mut client = Client::raw(addr).await;
        client.send(name).await;
        assert_eq!(client.recv().await, Event::Connected);
        client
            .recv_until(|event| matches!(event, Event::MessageHistory(_)))
            .await;
        client
    }

    async fn send(&mut self, record: &str) {
        self.wr
            .write_all(format!("{}\n", escape(record)).as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Event {
        let mut line = String::new();
        let read = timeout(Duration::from_secs(5), self.rd.read_line(&mut line))
            .await
            .expect("no record within 5s")
            .unwrap();
        assert!(read > 0, "connection closed");

        Event::decode(&unescape(line.trim_end_matches('\n'))).unwrap()
    }

    /// Reads until `wanted` matches, returning everything skipped and the match last
    async fn recv_until(&mut self, wanted: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            let event = self.recv().await;
            let done = wanted(&event);
            events.push(event);
            if done {
                return events;
            }
        }
    }

    async fn recv_notice(&mut self, text: &str) {
        let notice = Event::notice(text);
        self.recv_until(|event| *event == notice).await;
    }
}

fn has_command(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .is_ok()
}

/// Opens a code session as `client` and returns its id
async fn create_code_session(client: &mut Client, language: &str) -> String {
    client.send(&format!("CREATE_CODE_SESSION|{language}")).await;
    let events = client
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::SessionCreated { .. }))
        })
        .await;
    let Some(Event::CodeSession(CodeSessionEvent::SessionCreated { session_id, .. })) =
        events.last()
    else {
        unreachable!();
    };
    session_id.clone()
}

async fn recv_code_error(client: &mut Client) -> String {
    let events = client
        .recv_until(|event| matches!(event, Event::CodeSession(CodeSessionEvent::Error { .. })))
        .await;
    let Some(Event::CodeSession(CodeSessionEvent::Error { message })) = events.last() else {
        unreachable!();
    };
    message.clone()
}

async fn recv_execution_result(client: &mut Client) -> Event {
    let mut events = client
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::ExecutionResult { .. }))
        })
        .await;
    events.pop().unwrap()
}

fn chat(sender: &str, text: &str) -> Event {
    Event::Chat(ChatLine::Broadcast {
        sender: sender.to_string(),
        text: text.to_string(),
    })
}

async fn http_request(addr: SocketAddr, request: &[u8]) -> (u16, String, Vec<u8>) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request).await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), socket.read_to_end(&mut response))
        .await
        .expect("no response within 5s")
        .unwrap();

    let split = response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .unwrap();
    let head = String::from_utf8(response[..split].to_vec()).unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();

    (status, head, response[split + 4..].to_vec())
}

async fn upload(addr: SocketAddr, fields: &[(&str, &str)], file: (&str, &[u8])) -> (u16, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--b0undary\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--b0undary\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            file.0
        )
        .as_bytes(),
    );
    body.extend_from_slice(file.1);
    body.extend_from_slice(b"\r\n--b0undary--\r\n");

    let mut request = format!(
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: multipart/form-data; boundary=b0undary\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);

    let (status, _, body) = http_request(addr, &request).await;
    (status, body)
}

#[tokio::test]
async fn handshake_and_welcome() {
    let server = start().await;
    let mut alice = Client::raw(server.chat).await;

    alice.send("alice").await;
    assert_eq!(alice.recv().await, Event::Connected);

    let Event::ServerInfo(info) = alice.recv().await else {
        panic!("expected server info");
    };
    assert_eq!(info.active_users, vec!["alice"]);
    assert_eq!(info.http_port, server.http.port());
    assert!(info.supported_languages.contains(&"python".to_string()));
    assert!(info.file_upload_url.ends_with("/upload"));

    let Event::UserGroups(groups) = alice.recv().await else {
        panic!("expected user groups");
    };
    assert!(groups.groups.is_empty());

    let Event::MessageHistory(history) = alice.recv().await else {
        panic!("expected broadcast history");
    };
    assert_eq!(history.msg_type, "BROADCAST");
    assert!(history.messages.is_empty());

    assert_eq!(alice.recv().await, Event::notice("alice has joined the chat!"));
    let Event::UserList(list) = alice.recv().await else {
        panic!("expected user list");
    };
    assert_eq!(list.users, vec!["alice"]);
}

#[tokio::test]
async fn taken_and_invalid_names() {
    let server = start().await;
    let _alice = Client::join(server.chat, "alice").await;

    let mut impostor = Client::raw(server.chat).await;
    impostor.send("alice").await;
    assert_eq!(impostor.recv().await, Event::NameTaken);

    let mut reserved = Client::raw(server.chat).await;
    reserved.send("SERVER").await;
    assert_eq!(reserved.recv().await, Event::NameInvalid);

    let mut piped = Client::raw(server.chat).await;
    piped.send("a|b").await;
    assert_eq!(piped.recv().await, Event::NameInvalid);
}

#[tokio::test]
async fn broadcast_reaches_everyone_and_is_kept() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;

    alice.send("BROADCAST|hello\nall | of you").await;
    alice
        .recv_until(|event| *event == chat("alice", "hello\nall | of you"))
        .await;
    bob.recv_until(|event| *event == chat("alice", "hello\nall | of you"))
        .await;

    bob.send("GET_MESSAGES|broadcast").await;
    let events = bob
        .recv_until(|event| matches!(event, Event::MessageHistory(_)))
        .await;
    let Some(Event::MessageHistory(history)) = events.last() else {
        unreachable!();
    };
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].sender, "alice");
    assert_eq!(history.messages[0].content, "hello\nall | of you");

    let mut carol = Client::raw(server.chat).await;
    carol.send("carol").await;
    let events = carol
        .recv_until(|event| matches!(event, Event::MessageHistory(_)))
        .await;
    let Some(Event::MessageHistory(history)) = events.last() else {
        unreachable!();
    };
    assert_eq!(history.messages[0].content, "hello\nall | of you");
}

#[tokio::test]
async fn personal_messages() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;

    alice.send("PERSONAL|bob|psst").await;
    alice
        .recv_until(|event| {
            *event
                == Event::Chat(ChatLine::PersonalTo {
                    recipient: "bob".to_string(),
                    text: "psst".to_string(),
                })
        })
        .await;
    bob.recv_until(|event| {
        *event
            == Event::Chat(ChatLine::PersonalFrom {
                sender: "alice".to_string(),
                text: "psst".to_string(),
            })
    })
    .await;

    alice.send("PERSONAL|nobody|hi").await;
    alice.recv_notice("User 'nobody' not found or offline").await;
}

#[tokio::test]
async fn group_membership() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;
    let mut carol = Client::join(server.chat, "carol").await;

    alice.send("CREATE_GROUP|team|bob,dave").await;
    let events = alice
        .recv_until(|event| matches!(event, Event::GroupCreated(_)))
        .await;
    let Some(Event::GroupCreated(created)) = events.last() else {
        unreachable!();
    };
    assert_eq!(created.members, vec!["alice", "bob"]);
    assert_eq!(
        alice.recv().await,
        Event::notice("The following users were not found: dave")
    );
    bob.recv_until(|event| matches!(event, Event::GroupCreated(_)))
        .await;

    alice.send("CREATE_GROUP|team|carol").await;
    alice.recv_notice("Group 'team' already exists").await;

    carol.send("GROUP|team|let me in").await;
    carol.recv_notice("You are not a member of group 'team'").await;

    carol.send("GROUP|ghosts|boo").await;
    carol.recv_notice("Group 'ghosts' does not exist").await;

    let line = Event::Chat(ChatLine::Group {
        group: "team".to_string(),
        sender: "bob".to_string(),
        text: "hey".to_string(),
    });
    bob.send("GROUP|team|hey").await;
    bob.recv_until(|event| *event == line).await;
    alice.recv_until(|event| *event == line).await;

    bob.send("BROADCAST|done").await;
    let seen = carol.recv_until(|event| *event == chat("bob", "done")).await;
    assert!(
        !seen
            .iter()
            .any(|event| matches!(event, Event::Chat(ChatLine::Group { .. })))
    );

    bob.send("GET_MESSAGES|group|team").await;
    let events = bob
        .recv_until(|event| matches!(event, Event::MessageHistory(_)))
        .await;
    let Some(Event::MessageHistory(history)) = events.last() else {
        unreachable!();
    };
    assert_eq!(history.target.as_deref(), Some("team"));
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].content, "hey");

    bob.send("LIST_GROUPS").await;
    let events = bob
        .recv_until(|event| matches!(event, Event::UserGroups(_)))
        .await;
    let Some(Event::UserGroups(groups)) = events.last() else {
        unreachable!();
    };
    assert_eq!(groups.groups, vec!["team"]);
}

#[tokio::test]
async fn file_upload_and_download() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;

    let (status, body) = upload(
        server.http,
        &[("sender", "alice"), ("recipient", "bob")],
        ("notes\u{e9}.txt", b"line one\r\nline two\r\n"),
    )
    .await;
    assert_eq!(status, 200);

    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["status"], "success");
    let file_id = response["file_id"].as_str().unwrap().to_string();

    for client in [&mut alice, &mut bob] {
        let events = client
            .recv_until(|event| matches!(event, Event::FileNotification(_)))
            .await;
        let Some(Event::FileNotification(notification)) = events.last() else {
            unreachable!();
        };
        assert_eq!(notification.file_id, file_id);
        assert_eq!(notification.file_size, 20);
        assert_eq!(notification.mime_type, "text/plain");
    }

    let (status, head, content) = http_request(
        server.http,
        format!("GET /download/{file_id} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .as_bytes(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(content, b"line one\r\nline two\r\n");
    assert!(head.contains("filename*=UTF-8''notes%C3%A9.txt"));

    let (status, _, body) = http_request(
        server.http,
        b"GET /files?user=bob HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(status, 200);
    let files: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(files["files"][0]["file_id"], file_id.as_str());
    assert_eq!(
        files["files"][0]["download_url"],
        format!("/download/{file_id}").as_str()
    );

    bob.send("LIST_FILES").await;
    let events = bob
        .recv_until(|event| matches!(event, Event::FileList(_)))
        .await;
    let Some(Event::FileList(list)) = events.last() else {
        unreachable!();
    };
    assert_eq!(list.files.len(), 1);
    assert_eq!(list.files[0].filename, "notes\u{e9}.txt");
    assert_eq!(list.files[0].download_url, format!("/download/{file_id}"));

    let (status, _, _) = http_request(
        server.http,
        b"GET /files HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(status, 400);

    let (status, _, _) = http_request(
        server.http,
        b"GET /download/missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = upload(
        server.http,
        &[("sender", "alice"), ("group_name", "nowhere")],
        ("a.txt", b"x"),
    )
    .await;
    assert_eq!(status, 404);

    bob.send(&format!("DELETE_FILE|{file_id}")).await;
    let events = bob
        .recv_until(|event| matches!(event, Event::FileDeleteResponse(_)))
        .await;
    let Some(Event::FileDeleteResponse(response)) = events.last() else {
        unreachable!();
    };
    assert!(!response.success);

    alice.send(&format!("DELETE_FILE|{file_id}")).await;
    let events = alice
        .recv_until(|event| matches!(event, Event::FileDeleteResponse(_)))
        .await;
    let Some(Event::FileDeleteResponse(response)) = events.last() else {
        unreachable!();
    };
    assert!(response.success);
}

#[tokio::test]
async fn code_session_collaboration() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;

    alice.send("CREATE_CODE_SESSION|cobol").await;
    alice
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::Error { message }) if message.contains("cobol"))
        })
        .await;

    alice.send("CREATE_CODE_SESSION|python").await;
    let events = alice
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::SessionCreated { .. }))
        })
        .await;
    let Some(Event::CodeSession(CodeSessionEvent::SessionCreated {
        session_id, code, ..
    })) = events.last()
    else {
        unreachable!();
    };
    let session_id = session_id.clone();
    assert!(code.starts_with("# Welcome to collaborative python coding!"));

    bob.send(&format!("JOIN_CODE_SESSION|{session_id}")).await;
    let events = bob
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::SessionJoined { .. }))
        })
        .await;
    let Some(Event::CodeSession(CodeSessionEvent::SessionJoined { participants, .. })) =
        events.last()
    else {
        unreachable!();
    };
    assert_eq!(participants, &vec!["alice".to_string(), "bob".to_string()]);

    alice
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::UserJoined { user, .. }) if user == "bob")
        })
        .await;

    let update = serde_json::json!({
        "session_id": session_id,
        "code": "print('hi')\n",
        "cursor_pos": {"line": 1, "ch": 4},
    });
    alice.send(&format!("CODE_UPDATE|{update}")).await;
    let events = bob
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::CodeUpdate { .. }))
        })
        .await;
    let Some(Event::CodeSession(CodeSessionEvent::CodeUpdate {
        code,
        user,
        cursor_pos,
        ..
    })) = events.last()
    else {
        unreachable!();
    };
    assert_eq!(code, "print('hi')\n");
    assert_eq!(user, "alice");
    assert_eq!(cursor_pos, &Some(serde_json::json!({"line": 1, "ch": 4})));

    drop(bob);
    alice
        .recv_until(|event| {
            matches!(event, Event::CodeSession(CodeSessionEvent::UserLeft { user, participants, .. })
                if user == "bob" && participants == &vec!["alice".to_string()])
        })
        .await;
    alice.recv_notice("bob has left the chat").await;
}

#[tokio::test]
async fn code_invitations() {
    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;

    let session_id = create_code_session(&mut alice, "python").await;

    let invite = serde_json::json!({"recipient": "bob", "session_id": session_id});
    alice.send(&format!("INVITE_TO_CODE|{invite}")).await;
    bob.recv_until(|event| {
        *event
            == Event::CodeSession(CodeSessionEvent::CodeInvitation {
                from: "alice".to_string(),
                session_id: session_id.clone(),
                language: "python".to_string(),
            })
    })
    .await;

    let invite = serde_json::json!({"recipient": "dave", "session_id": session_id});
    alice.send(&format!("INVITE_TO_CODE|{invite}")).await;
    assert_eq!(
        recv_code_error(&mut alice).await,
        "User 'dave' not found or offline"
    );

    let invite = serde_json::json!({"recipient": "bob", "session_id": "nosuchid"});
    alice.send(&format!("INVITE_TO_CODE|{invite}")).await;
    assert_eq!(recv_code_error(&mut alice).await, "Code session not found");
}

#[tokio::test]
async fn execution_results_reach_every_participant() {
    let work_root = tempfile::tempdir().unwrap();
    let executor = CodeExecutor::new(vec![Language::interpreted(
        "sh",
        "sh",
        "#",
        &["sh", "{source}"],
        Duration::from_secs(5),
    )])
    .with_work_dir(work_root.path());

    let server = start_with_executor(executor).await;
    let mut alice = Client::join(server.chat, "alice").await;
    let mut bob = Client::join(server.chat, "bob").await;
    let mut carol = Client::join(server.chat, "carol").await;

    let session_id = create_code_session(&mut alice, "sh").await;
    bob.send(&format!("JOIN_CODE_SESSION|{session_id}")).await;
    bob.recv_until(|event| {
        matches!(event, Event::CodeSession(CodeSessionEvent::SessionJoined { .. }))
    })
    .await;

    let run = serde_json::json!({
        "session_id": session_id,
        "code": "read x\necho \"got $x\"\n",
        "input": "42\n",
    });

    carol.send(&format!("EXECUTE_CODE|{run}")).await;
    assert_eq!(
        recv_code_error(&mut carol).await,
        format!("carol is not a participant of code session {session_id}")
    );

    alice.send(&format!("EXECUTE_CODE|{run}")).await;
    for client in [&mut alice, &mut bob] {
        let Event::CodeSession(CodeSessionEvent::ExecutionResult {
            session_id: executed_in,
            result,
            executed_by,
        }) = recv_execution_result(client).await
        else {
            unreachable!();
        };
        assert_eq!(executed_in, session_id);
        assert_eq!(executed_by, "alice");
        assert!(result.success);
        assert_eq!(result.stdout, "got 42\n");
        assert_eq!(result.exit_status, Some(0));
    }

    bob.send("BROADCAST|done").await;
    let seen = carol.recv_until(|event| *event == chat("bob", "done")).await;
    assert!(!seen.iter().any(|event| matches!(
        event,
        Event::CodeSession(CodeSessionEvent::ExecutionResult { .. })
    )));
}

#[tokio::test]
async fn python_session_runs_code() {
    if !has_command("python3") {
        eprintln!("python3 not installed, skipping");
        return;
    }

    let server = start().await;
    let mut alice = Client::join(server.chat, "alice").await;
    let session_id = create_code_session(&mut alice, "python").await;

    let run = serde_json::json!({"session_id": session_id, "code": "print(1+1)"});
    alice.send(&format!("EXECUTE_CODE|{run}")).await;

    let Event::CodeSession(CodeSessionEvent::ExecutionResult { result, .. }) =
        recv_execution_result(&mut alice).await
    else {
        unreachable!();
    };
    assert!(result.success);
    assert_eq!(result.stdout, "2\n");
    assert_eq!(result.stderr, "");
}
